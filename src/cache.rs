use moka::future::Cache as MokaCache;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::hash::Hash;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Query parameters of an upstream request, kept in canonical (sorted) order
pub type QueryParams = BTreeMap<String, String>;

/// Prefix shared by every response cache key
pub const CACHE_KEY_PREFIX: &str = "pubmed_cache:";

/// Fingerprint a request by its URL and query parameters
///
/// Parameters are serialized from a sorted map, so insertion order never
/// affects the key. The result is `pubmed_cache:` followed by 64 hex digits.
///
/// # Example
///
/// ```
/// use pubmed_gateway::cache::{cache_key, QueryParams};
///
/// let mut params = QueryParams::new();
/// params.insert("db".into(), "pubmed".into());
/// params.insert("term".into(), "asthma".into());
///
/// let key = cache_key("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi", &params);
/// assert!(key.starts_with("pubmed_cache:"));
/// assert_eq!(key.len(), "pubmed_cache:".len() + 64);
/// ```
pub fn cache_key(url: &str, params: &QueryParams) -> String {
    let mut material = String::with_capacity(url.len() + 64);
    material.push_str(url);
    material.push('?');
    material.push('{');
    for (i, (name, value)) in params.iter().enumerate() {
        if i > 0 {
            material.push_str(", ");
        }
        // JSON string escaping keeps "a=b" and "a","=b" apart
        material.push_str(&serde_json::Value::from(name.as_str()).to_string());
        material.push_str(": ");
        material.push_str(&serde_json::Value::from(value.as_str()).to_string());
    }
    material.push('}');

    let digest = Sha256::digest(material.as_bytes());
    format!("{}{:x}", CACHE_KEY_PREFIX, digest)
}

/// Selects which storage backend to use for caching
#[derive(Debug, Clone, Default)]
pub enum CacheBackendConfig {
    /// No cache; every lookup misses
    Disabled,
    /// In-memory cache using Moka (default)
    #[default]
    Memory,
    /// Redis-backed shared cache
    ///
    /// Requires the `cache-redis` feature.
    #[cfg(feature = "cache-redis")]
    Redis {
        /// Redis connection URL, e.g. `"redis://127.0.0.1/"`
        url: String,
    },
}

impl CacheBackendConfig {
    /// Redis when the `cache-redis` feature is compiled in, memory otherwise
    pub fn redis_or_memory(url: String) -> Self {
        #[cfg(feature = "cache-redis")]
        {
            CacheBackendConfig::Redis { url }
        }

        #[cfg(not(feature = "cache-redis"))]
        {
            warn!(url = %url, "Redis requested but the cache-redis feature is off, using memory cache");
            CacheBackendConfig::Memory
        }
    }
}

/// Configuration for response caching
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of items to store (used by the memory backend)
    pub max_capacity: u64,
    /// Time-to-live for cached items
    pub time_to_live: Duration,
    /// Which storage backend to use
    pub backend: CacheBackendConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live: Duration::from_secs(60 * 60),
            backend: CacheBackendConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Memory backend
// ---------------------------------------------------------------------------

/// In-memory cache backed by Moka
#[derive(Clone)]
pub struct MemoryCache<K, V> {
    cache: MokaCache<K, V>,
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .build();
        Self { cache }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value).await;
    }

    pub async fn clear(&self) {
        self.cache.invalidate_all();
        info!("Cache cleared");
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

// ---------------------------------------------------------------------------
// Redis backend (feature = "cache-redis")
// ---------------------------------------------------------------------------

/// Redis-backed cache storing raw JSON text.
///
/// TTL is applied per entry via `SET … EX`. Each operation opens a
/// multiplexed connection, so an unreachable server shows up as a per-call
/// error, which the caller logs and treats as a miss.
#[cfg(feature = "cache-redis")]
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
    ttl: Duration,
}

#[cfg(feature = "cache-redis")]
impl RedisCache {
    pub fn new(url: &str, ttl: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client, ttl })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, crate::error::CacheError> {
        use redis::AsyncCommands;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    pub async fn insert(&self, key: &str, value: &str) -> Result<(), crate::error::CacheError> {
        use redis::AsyncCommands;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, value, self.ttl.as_secs().max(1)).await?;
        Ok(())
    }

    /// Delete the keys this crate wrote (`pubmed_cache:*`), leaving the rest
    /// of the database untouched. Returns the number of keys removed.
    pub async fn clear(&self) -> Result<usize, crate::error::CacheError> {
        use redis::AsyncCommands;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pattern = format!("{}*", CACHE_KEY_PREFIX);

        let mut removed = 0;
        let mut cursor: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            if !keys.is_empty() {
                let _: () = conn.del(&keys).await?;
                removed += keys.len();
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Unified ResponseCache enum
// ---------------------------------------------------------------------------

/// Raw upstream response cache that dispatches to the configured backend.
///
/// Backend failures never reach the caller: `get` degrades to a miss and
/// `set` to a no-op, with the error logged.
#[derive(Clone)]
pub enum ResponseCache {
    Memory(MemoryCache<String, String>),
    #[cfg(feature = "cache-redis")]
    Redis(RedisCache),
}

impl ResponseCache {
    /// In-memory cache with the given settings
    pub fn memory(config: &CacheConfig) -> Self {
        ResponseCache::Memory(MemoryCache::new(config))
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let value = match self {
            ResponseCache::Memory(c) => c.get(&key.to_owned()).await,
            #[cfg(feature = "cache-redis")]
            ResponseCache::Redis(c) => match c.get(key).await {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!(key = %key, error = %e, "Cache GET failed, proceeding without cache");
                    None
                }
            },
        };

        if value.is_some() {
            debug!(key = %key, "Cache hit");
        } else {
            debug!(key = %key, "Cache miss");
        }
        value
    }

    pub async fn set(&self, key: &str, value: String) {
        match self {
            ResponseCache::Memory(c) => c.insert(key.to_owned(), value).await,
            #[cfg(feature = "cache-redis")]
            ResponseCache::Redis(c) => {
                if let Err(e) = c.insert(key, &value).await {
                    tracing::error!(key = %key, error = %e, "Cache SET failed");
                    return;
                }
            }
        }
        debug!(key = %key, "Response stored in cache");
    }

    pub async fn clear(&self) {
        match self {
            ResponseCache::Memory(c) => c.clear().await,
            #[cfg(feature = "cache-redis")]
            ResponseCache::Redis(c) => match c.clear().await {
                Ok(removed) => info!(removed, "Cache cleared (Redis)"),
                Err(e) => tracing::error!(error = %e, "Cache clear failed"),
            },
        }
    }

    /// Entry count for the memory backend; always 0 for Redis
    pub fn entry_count(&self) -> u64 {
        match self {
            ResponseCache::Memory(c) => c.entry_count(),
            #[cfg(feature = "cache-redis")]
            ResponseCache::Redis(_) => 0,
        }
    }

    /// Flush pending maintenance work (memory backend only)
    pub async fn sync(&self) {
        match self {
            ResponseCache::Memory(c) => c.sync().await,
            #[cfg(feature = "cache-redis")]
            ResponseCache::Redis(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Create a [`ResponseCache`] from configuration.
///
/// Returns `None` for [`CacheBackendConfig::Disabled`]. Falls back to the
/// memory backend if the configured backend cannot be initialised (error is
/// logged via `tracing::error!`).
pub fn create_cache(config: &CacheConfig) -> Option<ResponseCache> {
    match &config.backend {
        CacheBackendConfig::Disabled => {
            warn!("Response cache disabled, every request goes upstream");
            None
        }
        CacheBackendConfig::Memory => Some(ResponseCache::memory(config)),
        #[cfg(feature = "cache-redis")]
        CacheBackendConfig::Redis { url } => match RedisCache::new(url, config.time_to_live) {
            Ok(c) => {
                info!(url = %url, "Using Redis response cache");
                Some(ResponseCache::Redis(c))
            }
            Err(e) => {
                tracing::error!("Failed to create Redis cache, falling back to memory: {e}");
                Some(ResponseCache::memory(config))
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
