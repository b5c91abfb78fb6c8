//! Search service: the derived index behind HTTP, plus the channel
//! consumer that keeps it eventually consistent.

use classhub_core::event_bus::EventBus;
use classhub_core::index::SearchIndex;
use classhub_indexer::{IndexSynchronizer, SolrIndex};
use classhub_redpanda::RedpandaEventBus;
use classhub_runtime::consumer::{EventConsumer, EventHandler};
use classhub_web::{Config, SearchState, search_router};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let index: Arc<dyn SearchIndex> = Arc::new(SolrIndex::new(
        config.solr.base_url.clone(),
        config.solr.collection.clone(),
    )?);

    let bus: Arc<dyn EventBus> = Arc::new(
        RedpandaEventBus::builder()
            .brokers(config.channel.brokers.clone())
            .consumer_group(config.channel.consumer_group.clone())
            .build()?,
    );

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let consumer = EventConsumer::new(
        "index-synchronizer",
        config.channel.topic.clone(),
        Arc::clone(&bus),
        Arc::new(IndexSynchronizer::new(Arc::clone(&index))) as Arc<dyn EventHandler>,
        shutdown_rx,
    )
    .spawn();

    let app = search_router(SearchState::new(index));
    let addr = config.search_server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, topic = %config.channel.topic, "search service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the consumer after the HTTP server has drained.
    let _ = shutdown_tx.send(());
    consumer.await?;

    info!("search service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
