use rcache::prelude::*;
use rcache::TracingMetrics;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE) // TRACE shows per-operation latency
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let metrics = TracingMetrics::new().with_service_name("example-service");
    let cache = Cache::with_serializer_and_metrics(
        MemoryStore::new(),
        JsonSerializer,
        metrics,
        CacheConfig::default(),
    );

    cache.set("user:1", "Alice").await?;
    println!("Got: {}", cache.get("user:1").await?);

    // Miss, producer runs
    println!("Got: {}", cache.fetch("user:2", || "Bob").await?);

    // Absent key
    println!("Got: {:?}", cache.get("user:99").await);

    Ok(())
}
