use rcache::prelude::*;
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = RedisConfig::from_env().pool_size(5);
    println!("Connecting to Redis at {}", config.url);

    let client = match RedisClient::new(config).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to Redis: {}", e);
            println!("Make sure Redis is running at 127.0.0.1:6379 or set REDIS_URL");
            return Ok(());
        }
    };

    let cache = Cache::with_config(client, CacheConfig::with_namespace("example"));

    cache.set("hello", "world").await?;
    println!("hello = {}", cache.get("hello").await?);

    let value = cache.fetch("lazy", || "computed once").await?;
    println!("lazy = {}", value);

    cache
        .expire_with("lazy", ExpireCommand::Expire(Duration::from_secs(30)))
        .await?;
    cache.do_command("PERSIST", "lazy", "").await?;

    cache.delete("hello").await?;
    cache.delete("lazy").await?;
    Ok(())
}
