//! Blank info caching per coil

use std::sync::Arc;
use parking_lot::RwLock;
use ahash::AHashMap;

use cv_core::BlankInfo;

/// Last blank info array generated for each coil.
///
/// Reloading a coil with unchanged row count reuses the cached array.
#[derive(Clone, Default)]
pub struct BlankInfoCache {
    entries: Arc<RwLock<AHashMap<String, BlankInfo>>>,
}

impl BlankInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coil: &str) -> Option<BlankInfo> {
        self.entries.read().get(coil).cloned()
    }

    /// Cached array for a coil only if it has exactly `rows` entries
    pub fn get_matching(&self, coil: &str, rows: usize) -> Option<BlankInfo> {
        self.entries
            .read()
            .get(coil)
            .filter(|info| info.len() == rows)
            .cloned()
    }

    pub fn put(&self, coil: &str, blank_info: BlankInfo) {
        self.entries.write().insert(coil.to_string(), blank_info);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_matching_checks_length() {
        let cache = BlankInfoCache::new();
        cache.put("coil50", BlankInfo::contiguous(1, 12));

        assert!(cache.get_matching("coil50", 12).is_some());
        assert!(cache.get_matching("coil50", 13).is_none());
        assert!(cache.get_matching("coil51", 12).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }
}
