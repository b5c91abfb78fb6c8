//! Mock implementations of the core ports.

use async_trait::async_trait;
use classhub_core::course_store::{CourseStore, CourseStoreError};
use classhub_core::event::CourseChangeEvent;
use classhub_core::event_bus::{EventBus, EventBusError, EventStream};
use classhub_core::index::{IndexDocument, IndexError, SearchIndex};
use classhub_core::ledger::{EnrollmentLedger, LedgerError};
use classhub_core::types::{CourseId, CourseSnapshot, Enrollment, EnrollmentId, UserId};
use classhub_core::users::{UserDirectory, UserDirectoryError};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// In-memory enrollment ledger.
///
/// The duplicate check, the capacity guard, and the insert all run under
/// one mutex, mirroring the atomicity the Postgres ledger gets from its
/// single conditional-insert statement. Concurrency tests against this
/// fake therefore exercise the same contract as production.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: Mutex<LedgerInner>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct LedgerInner {
    next_id: i64,
    rows: Vec<Enrollment>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("ledger offline".to_string()));
        }
        Ok(())
    }

    #[allow(clippy::unwrap_used)] // mutex poisoning only happens after a test already panicked
    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl EnrollmentLedger for InMemoryLedger {
    async fn insert_within_capacity(
        &self,
        user_id: UserId,
        course_id: CourseId,
        capacity: u32,
    ) -> Result<Enrollment, LedgerError> {
        self.check_available()?;
        let mut inner = self.lock();

        if inner
            .rows
            .iter()
            .any(|e| e.user_id == user_id && e.course_id == course_id)
        {
            return Err(LedgerError::Duplicate { user_id, course_id });
        }

        let count = inner.rows.iter().filter(|e| e.course_id == course_id).count();
        if count >= capacity as usize {
            return Err(LedgerError::CapacityExceeded(course_id));
        }

        inner.next_id += 1;
        let enrollment = Enrollment {
            id: EnrollmentId(inner.next_id),
            user_id,
            course_id,
        };
        inner.rows.push(enrollment.clone());
        Ok(enrollment)
    }

    async fn count_by_course(&self, course_id: CourseId) -> Result<u64, LedgerError> {
        self.check_available()?;
        let inner = self.lock();
        Ok(inner.rows.iter().filter(|e| e.course_id == course_id).count() as u64)
    }

    async fn list(&self) -> Result<Vec<Enrollment>, LedgerError> {
        self.check_available()?;
        Ok(self.lock().rows.clone())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, LedgerError> {
        self.check_available()?;
        let inner = self.lock();
        Ok(inner
            .rows
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_by_course(&self, course_id: CourseId) -> Result<Vec<Enrollment>, LedgerError> {
        self.check_available()?;
        let inner = self.lock();
        Ok(inner
            .rows
            .iter()
            .filter(|e| e.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn delete_by_course(&self, course_id: CourseId) -> Result<u64, LedgerError> {
        self.check_available()?;
        let mut inner = self.lock();
        let before = inner.rows.len();
        inner.rows.retain(|e| e.course_id != course_id);
        Ok((before - inner.rows.len()) as u64)
    }
}

/// In-memory course store with a switchable outage mode.
#[derive(Default)]
pub struct InMemoryCourseStore {
    courses: Mutex<HashMap<CourseId, CourseSnapshot>>,
    unavailable: AtomicBool,
}

impl InMemoryCourseStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a course record.
    #[allow(clippy::unwrap_used)]
    pub fn put(&self, snapshot: CourseSnapshot) {
        self.courses.lock().unwrap().insert(snapshot.id, snapshot);
    }

    /// Make every subsequent fetch fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl CourseStore for InMemoryCourseStore {
    #[allow(clippy::unwrap_used)]
    async fn fetch(&self, course_id: CourseId) -> Result<CourseSnapshot, CourseStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CourseStoreError::Unavailable(
                "course store timed out".to_string(),
            ));
        }
        self.courses
            .lock()
            .unwrap()
            .get(&course_id)
            .cloned()
            .ok_or(CourseStoreError::NotFound(course_id))
    }
}

/// User directory backed by a fixed set of known users.
#[derive(Default)]
pub struct StaticUserDirectory {
    known: Mutex<Vec<UserId>>,
    unavailable: AtomicBool,
}

impl StaticUserDirectory {
    /// Create a directory knowing the given users.
    #[must_use]
    pub fn with_users(users: &[UserId]) -> Self {
        Self {
            known: Mutex::new(users.to_vec()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Make every subsequent check fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    #[allow(clippy::unwrap_used)]
    async fn verify(&self, user_id: UserId) -> Result<(), UserDirectoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(UserDirectoryError::Unavailable(
                "identity service timed out".to_string(),
            ));
        }
        if self.known.lock().unwrap().contains(&user_id) {
            Ok(())
        } else {
            Err(UserDirectoryError::NotFound(user_id))
        }
    }
}

type SubscriberSender = mpsc::UnboundedSender<Result<CourseChangeEvent, EventBusError>>;

/// In-memory event bus with at-least-once flavor.
///
/// Every subscriber of a topic receives every event published to it, in
/// publish order per subscriber. Duplicates are produced the same way the
/// real channel produces them: by publishing again. `fail_publishes`
/// simulates broker outages for retry tests.
#[derive(Default)]
pub struct InMemoryEventBus {
    topics: Mutex<HashMap<String, Vec<SubscriberSender>>>,
    publish_failures: AtomicUsize,
}

impl InMemoryEventBus {
    /// Create a bus with no topics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` publishes with a transport error.
    pub fn fail_publishes(&self, n: usize) {
        self.publish_failures.store(n, Ordering::SeqCst);
    }

    /// Push a raw error item to every subscriber of `topic`, simulating an
    /// undecodable message on the wire.
    #[allow(clippy::unwrap_used)]
    pub fn inject_error(&self, topic: &str, error: EventBusError) {
        let topics = self.topics.lock().unwrap();
        if let Some(senders) = topics.get(topic) {
            for sender in senders {
                let _ = sender.send(Err(error.clone()));
            }
        }
    }

    /// Wait until at least one subscriber is registered for `topic`.
    ///
    /// Test helper to avoid publishing into the void while a consumer task
    /// is still starting up.
    #[allow(clippy::unwrap_used)]
    pub async fn wait_for_subscriber(&self, topic: &str) {
        loop {
            {
                let topics = self.topics.lock().unwrap();
                if topics.get(topic).is_some_and(|s| !s.is_empty()) {
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
    }

    #[allow(clippy::unwrap_used)]
    fn deliver(&self, topic: &str, event: &CourseChangeEvent) {
        let mut topics = self.topics.lock().unwrap();
        if let Some(senders) = topics.get_mut(topic) {
            senders.retain(|sender| sender.send(Ok(event.clone())).is_ok());
        }
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &CourseChangeEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();

        Box::pin(async move {
            if self
                .publish_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(EventBusError::PublishFailed {
                    topic,
                    reason: "injected broker outage".to_string(),
                });
            }

            // Round-trip through the JSON wire form so serialization bugs
            // surface in unit tests, not just against a real broker.
            let bytes = event.to_json().map_err(|e| EventBusError::PublishFailed {
                topic: topic.clone(),
                reason: e.to_string(),
            })?;
            let decoded = CourseChangeEvent::from_json(&bytes)
                .map_err(|e| EventBusError::DeserializationFailed(e.to_string()))?;

            self.deliver(&topic, &decoded);
            Ok(())
        })
    }

    #[allow(clippy::unwrap_used)]
    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topic = topic.to_string();

        Box::pin(async move {
            let (tx, mut rx) = mpsc::unbounded_channel();
            self.topics.lock().unwrap().entry(topic).or_default().push(tx);

            let stream = async_stream::stream! {
                while let Some(item) = rx.recv().await {
                    yield item;
                }
            };

            Ok(Box::pin(stream) as EventStream)
        })
    }
}

/// Wrapper that fails the first `n` index writes with a transient error.
///
/// Reads pass straight through. Used to test the synchronizer's
/// redelivery path.
pub struct FlakyIndex<I> {
    inner: I,
    failures_left: AtomicUsize,
}

impl<I> FlakyIndex<I> {
    /// Wrap `inner`, failing the first `n` upserts/deletes.
    #[must_use]
    pub const fn new(inner: I, n: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(n),
        }
    }

    fn should_fail(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<I: SearchIndex> SearchIndex for FlakyIndex<I> {
    async fn upsert(&self, doc: IndexDocument) -> Result<(), IndexError> {
        if self.should_fail() {
            return Err(IndexError::Transient("injected index outage".to_string()));
        }
        self.inner.upsert(doc).await
    }

    async fn delete(&self, course_id: CourseId) -> Result<(), IndexError> {
        if self.should_fail() {
            return Err(IndexError::Transient("injected index outage".to_string()));
        }
        self.inner.delete(course_id).await
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IndexDocument>, IndexError> {
        self.inner.search(query, limit, offset).await
    }
}
