//! Basic usage of typed caches over a shared store.

use memcache_typed::{
    backend::InMemoryBackend, error::Result, observability::LogMetrics, CacheManager, Cacheable,
    TypeRegistry,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Example value: Employment
#[derive(Clone, Serialize, Deserialize, Debug)]
struct Employment {
    id: String,
    employer_name: String,
    salary_cents: u64,
    end_date: Option<String>,
}

impl Cacheable for Employment {
    fn type_tag() -> &'static str {
        "employment"
    }
}

/// Simulated database lookup
async fn fetch_employment(id: &str) -> std::result::Result<Option<Employment>, String> {
    println!("  [DB] Fetching employment: {}", id);

    Ok(match id {
        "emp_001" => Some(Employment {
            id: id.to_string(),
            employer_name: "Acme Corp".to_string(),
            salary_cents: 7_500_000,
            end_date: None,
        }),
        "emp_002" => Some(Employment {
            id: id.to_string(),
            employer_name: "Tech Inc".to_string(),
            salary_cents: 9_500_000,
            end_date: Some("2024-06-01".to_string()),
        }),
        _ => None,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== memcache-typed - Basic Example ===\n");

    // 1. Build caches over one store
    println!("1. Initializing in-memory store and cache manager...");
    let registry = Arc::new(TypeRegistry::with_defaults().with::<Employment>());
    let manager = CacheManager::new(InMemoryBackend::new())
        .with_registry(registry)
        .with_metrics(Arc::new(LogMetrics))
        .with_ttl("sessions", Duration::from_secs(1800));
    let employments = manager.cache("employments");
    println!("   ✓ Cache#{} ready (TTL {:?})\n", employments.name(), employments.ttl());

    // 2. First request - cache miss, loader runs
    println!("2. First request for emp_001:");
    if let Some(emp) = employments
        .get_or_load("emp_001", || fetch_employment("emp_001"))
        .await?
    {
        println!("   ✓ Loaded: {} ({} cents)\n", emp.employer_name, emp.salary_cents);
    }

    // 3. Second request - cache hit, loader not called
    println!("3. Second request for emp_001:");
    if let Some(emp) = employments
        .get_or_load("emp_001", || fetch_employment("emp_001"))
        .await?
    {
        println!("   ✓ From cache: {}\n", emp.employer_name);
    }

    // 4. Unknown id - nothing is cached
    println!("4. Request for unknown emp_404:");
    let missing = employments
        .get_or_load("emp_404", || fetch_employment("emp_404"))
        .await?;
    println!("   ✓ Found: {:?}\n", missing.is_some());

    // 5. Scalars and untyped reads
    println!("5. Scalars in another cache:");
    let sessions = manager.cache("sessions");
    sessions.put("token_abc", &"user_42".to_string()).await?;
    if let Some(value) = sessions.get("token_abc").await? {
        println!(
            "   ✓ token_abc is a '{}': {:?}\n",
            value.type_tag(),
            value.downcast_ref::<String>()
        );
    }

    // 6. put_if_absent keeps the first value
    println!("6. put_if_absent:");
    let existing = sessions.put_if_absent("token_abc", &"user_99".to_string()).await?;
    println!("   ✓ Existing value kept: {}\n", existing.is_some());

    // 7. Evict and health
    println!("7. Evict emp_001 and probe the store:");
    employments.evict("emp_001").await;
    println!("   ✓ Cached after evict: {}", employments.get("emp_001").await?.is_some());
    let health = manager.health_probe().check().await;
    println!("   ✓ Store health: {:?} ({}ms)\n", health.status, health.latency_ms);

    println!("Caches created: {:?}", manager.cache_names());

    Ok(())
}
