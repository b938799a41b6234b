use fxhash::FxHashMap;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::raw_trigger::RawTrigger;

/// Identifies one trigger file: (folder, channel, index)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriggerKey {
    pub folder: PathBuf,
    pub channel: String,
    pub index: u32,
}

impl TriggerKey {
    pub fn new(folder: &Path, channel: &str, index: u32) -> Self {
        Self {
            folder: folder.to_path_buf(),
            channel: channel.to_string(),
            index,
        }
    }
}

/// Memoization of decoded triggers.
///
/// Entries are never overwritten: `insert_if_absent` keeps the first value stored for a
/// key and hands that value back.
pub trait TriggerCache: Send {
    fn get(&mut self, key: &TriggerKey) -> Option<Arc<RawTrigger>>;
    fn insert_if_absent(&mut self, key: TriggerKey, trigger: Arc<RawTrigger>) -> Arc<RawTrigger>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Growth-only cache. Holds every trigger for the lifetime of the cache.
#[derive(Debug, Default)]
pub struct UnboundedCache {
    map: FxHashMap<TriggerKey, Arc<RawTrigger>>,
}

impl UnboundedCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerCache for UnboundedCache {
    fn get(&mut self, key: &TriggerKey) -> Option<Arc<RawTrigger>> {
        self.map.get(key).cloned()
    }

    fn insert_if_absent(&mut self, key: TriggerKey, trigger: Arc<RawTrigger>) -> Arc<RawTrigger> {
        self.map.entry(key).or_insert(trigger).clone()
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Least-recently-used cache holding at most `capacity` triggers.
#[derive(Debug)]
pub struct LruCache {
    map: FxHashMap<TriggerKey, Arc<RawTrigger>>,
    order: VecDeque<TriggerKey>, // front is the least recently used
    capacity: usize,
}

impl LruCache {
    /// A capacity of 0 is raised to 1
    pub fn new(capacity: usize) -> Self {
        Self {
            map: FxHashMap::default(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn touch(&mut self, key: &TriggerKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

impl TriggerCache for LruCache {
    fn get(&mut self, key: &TriggerKey) -> Option<Arc<RawTrigger>> {
        let found = self.map.get(key).cloned();
        if found.is_some() {
            self.touch(key);
        }
        found
    }

    fn insert_if_absent(&mut self, key: TriggerKey, trigger: Arc<RawTrigger>) -> Arc<RawTrigger> {
        if let Some(existing) = self.map.get(&key).cloned() {
            self.touch(&key);
            return existing;
        }
        while self.map.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.map.insert(key, trigger.clone());
        trigger
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_waveform;

    fn make_trigger(value: f64) -> Arc<RawTrigger> {
        Arc::new(RawTrigger::try_from(make_waveform(&[value], 0.0)).unwrap())
    }

    #[test]
    fn test_first_writer_wins() {
        let mut cache = UnboundedCache::new();
        let key = TriggerKey::new(Path::new("run"), "C4", 2);
        let first = make_trigger(1.0);
        let stored = cache.insert_if_absent(key.clone(), first.clone());
        assert!(Arc::ptr_eq(&stored, &first));
        let stored = cache.insert_if_absent(key.clone(), make_trigger(2.0));
        assert!(Arc::ptr_eq(&stored, &first));
        assert!(Arc::ptr_eq(&cache.get(&key).unwrap(), &first));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = LruCache::new(2);
        let a = TriggerKey::new(Path::new("run"), "C4", 2);
        let b = TriggerKey::new(Path::new("run"), "C4", 3);
        let c = TriggerKey::new(Path::new("run"), "C4", 4);
        cache.insert_if_absent(a.clone(), make_trigger(1.0));
        cache.insert_if_absent(b.clone(), make_trigger(2.0));
        // Touching a makes b the eviction candidate
        assert!(cache.get(&a).is_some());
        cache.insert_if_absent(c.clone(), make_trigger(3.0));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn test_keys_distinguish_channel_and_folder() {
        let mut cache = UnboundedCache::new();
        cache.insert_if_absent(TriggerKey::new(Path::new("a"), "C4", 2), make_trigger(1.0));
        cache.insert_if_absent(TriggerKey::new(Path::new("a"), "C1", 2), make_trigger(2.0));
        cache.insert_if_absent(TriggerKey::new(Path::new("b"), "C4", 2), make_trigger(3.0));
        assert_eq!(cache.len(), 3);
    }
}
