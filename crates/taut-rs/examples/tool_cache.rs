//! Tool-result caching example: skip repeated tool runs.
//!
//! Simulates a file-reading tool behind a [`ToolResultCache`]: the first
//! call executes and stores, the second is served from cache, and a write
//! to the file invalidates every entry derived from it.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example tool_cache
//! ```

use serde_json::{Value, json};
use std::sync::Arc;
use taut_rs::prelude::*;

/// Stand-in for a real tool run.
fn run_read_tool(parameters: &Value) -> Value {
    println!("  (executing read tool for {parameters})");
    json!({"content": "fn main() { println!(\"hi\"); }"})
}

#[tokio::main]
async fn main() {
    // 1. One cache per tool namespace, swept periodically in the
    //    background for as long as the sweeper handle lives.
    let cache = Arc::new(ToolResultCache::new(
        CacheConfig::new()
            .with_namespace("read_file")
            .with_default_ttl(60_000),
    ));
    let _sweeper = cache.clone().spawn_cleanup();

    let params = json!({"path": "src/main.rs"});
    let key = cache.generate_key(&params);

    // 2. First call misses and executes the tool.
    if cache.get(key).is_none() {
        let result = run_read_tool(&params);
        cache.set(key, params.clone(), result, vec!["src/main.rs".to_string()]);
    }

    // 3. Second call is a hit; no execution.
    if let Some(cached) = cache.get(key) {
        println!("cache hit, access_count = {}", cached.access_count);
    }

    // 4. A successful write elsewhere invalidates everything that was
    //    derived from the file.
    let removed = cache.invalidate_by_dependency("src/main.rs");
    println!("invalidated {removed} entries after write");
    assert!(cache.get(key).is_none());

    println!("{}", cache.stats().to_log_string());
}
