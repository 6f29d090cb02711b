use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

/// Ordered URL parts, base first. Compared structurally.
pub type UrlKey = Vec<String>;

/// Storage for joined URLs. Entries are written once and never evicted.
pub trait UrlCache: Send + Sync {
    fn get(&self, key: &UrlKey) -> Option<String>;
    fn put(&self, key: UrlKey, value: String);
}

/// Unbounded in-memory cache.
#[derive(Debug, Default)]
pub struct MemoryUrlCache {
    entries: DashMap<UrlKey, String>,
}

impl MemoryUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UrlCache for MemoryUrlCache {
    fn get(&self, key: &UrlKey) -> Option<String> {
        self.entries.get(key).map(|url| url.value().clone())
    }

    fn put(&self, key: UrlKey, value: String) {
        self.entries.entry(key).or_insert(value);
    }
}

/// Joins a base URL and path segments with `/`, memoizing the result.
///
/// Segments are trusted: no encoding, no slash de-duplication.
#[derive(Clone)]
pub struct UrlBuilder {
    base_url: String,
    cache: Arc<dyn UrlCache>,
}

impl UrlBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_cache(base_url, Arc::new(MemoryUrlCache::new()))
    }

    pub fn with_cache(base_url: impl Into<String>, cache: Arc<dyn UrlCache>) -> Self {
        Self {
            base_url: base_url.into(),
            cache,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build `<base>/<seg>/<seg>...`, using `base` instead of the default base when given.
    pub fn build<I, S>(&self, base: Option<&str>, segments: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let mut key: UrlKey = vec![base.unwrap_or(&self.base_url).to_string()];
        key.extend(segments.into_iter().map(|s| s.to_string()));
        debug!(parts = ?key, "Building url");

        if let Some(url) = self.cache.get(&key) {
            return url;
        }

        trace!("Url cache miss");
        let url = key.join("/");
        self.cache.put(key, url.clone());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingCache {
        inner: MemoryUrlCache,
        puts: AtomicUsize,
    }

    impl UrlCache for CountingCache {
        fn get(&self, key: &UrlKey) -> Option<String> {
            self.inner.get(key)
        }

        fn put(&self, key: UrlKey, value: String) {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value);
        }
    }

    #[test]
    fn test_build_joins_with_slash() {
        let builder = UrlBuilder::new("https://integra.ons.org.br/api");
        assert_eq!(
            builder.build(None, ["hidrologia", "reservatorios"]),
            "https://integra.ons.org.br/api/hidrologia/reservatorios"
        );
    }

    #[test]
    fn test_build_coerces_segments_to_string() {
        let builder = UrlBuilder::new("http://h");
        assert_eq!(builder.build(None, [1, 2]), "http://h/1/2");
    }

    #[test]
    fn test_build_no_normalization() {
        let builder = UrlBuilder::new("http://h/");
        assert_eq!(builder.build(None, ["/a", "b c"]), "http://h///a/b c");
    }

    #[test]
    fn test_build_without_segments_is_base() {
        let builder = UrlBuilder::new("http://h");
        assert_eq!(builder.build(None, Vec::<String>::new()), "http://h");
    }

    #[test]
    fn test_build_is_cached() {
        let cache = Arc::new(CountingCache::default());
        let builder = UrlBuilder::with_cache("http://h", cache.clone());

        let first = builder.build(None, ["autenticar"]);
        let second = builder.build(None, ["autenticar"]);

        assert_eq!(first, second);
        assert_eq!(cache.puts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_override_base_is_part_of_key() {
        let cache = Arc::new(CountingCache::default());
        let builder = UrlBuilder::with_cache("http://h", cache.clone());

        assert_eq!(builder.build(Some("http://other"), ["x"]), "http://other/x");
        assert_eq!(builder.build(None, ["x"]), "http://h/x");
        assert_eq!(cache.puts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_memory_cache_is_write_once() {
        let cache = MemoryUrlCache::new();
        let key = vec!["a".to_string()];
        cache.put(key.clone(), "first".to_string());
        cache.put(key.clone(), "second".to_string());

        assert_eq!(cache.get(&key).as_deref(), Some("first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_shared_builder_across_threads() {
        let cache = Arc::new(CountingCache::default());
        let builder = UrlBuilder::with_cache("http://h", cache.clone());

        let urls: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let builder = builder.clone();
                    s.spawn(move || builder.build(None, ["seg", if i % 2 == 0 { "a" } else { "b" }]))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(urls.iter().all(|u| u == "http://h/seg/a" || u == "http://h/seg/b"));
        assert_eq!(cache.inner.len(), 2);
    }
}
