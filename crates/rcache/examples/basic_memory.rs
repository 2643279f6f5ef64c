//! Basic example demonstrating rcache with the in-memory store

use rcache::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct User {
    id: u64,
    name: String,
    email: String,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== rcache Basic Example ===\n");

    let cache = Cache::new(MemoryStore::new());

    let user = User {
        id: 123,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
    };

    // Structured values are stored as JSON
    cache.set("user:123", &Structured(&user)).await?;
    let loaded: User = cache.unmarshal("user:123").await?;
    println!("Loaded user: {} <{}>", loaded.name, loaded.email);
    println!("Raw payload: {}", cache.get("user:123").await?);

    // Fetch-or-compute: the producer only runs on a miss
    let first = cache.fetch("greeting", || "hello").await?;
    let second = cache.fetch("greeting", || "never stored").await?;
    println!("fetch: {} then {}", first, second);

    // Extended operations
    cache.incr_by("visits", 1).await?;
    cache.rpush("recent", "user:123").await?;
    cache.hset("profile:123", "theme", "dark").await?;
    cache.sadd("online", &123u64).await?;
    println!("visits = {}", cache.get("visits").await?);
    println!("recent[0] = {}", cache.lindex("recent", 0).await?);
    println!("profile = {:?}", cache.hgetall("profile:123").await?);

    // Keys expire only when asked to
    cache.expire("greeting", Duration::from_millis(50)).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    match cache.get("greeting").await {
        Err(err) if err.is_not_found() => println!("greeting expired"),
        other => println!("unexpected: {:?}", other),
    }

    cache.delete("user:123").await?;
    println!("\nDone.");
    Ok(())
}
