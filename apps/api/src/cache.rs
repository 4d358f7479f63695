//! Bounded in-memory cache for parsed CVs.
//!
//! The map and its eviction order live behind one mutex: insert-then-evict is a single
//! critical section, so concurrent uploads can never push the cache past its capacity.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::cv::ParsedCv;

/// Which entry goes first when the cache is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Least recently inserted *or read* entry is evicted.
    #[default]
    Lru,
    /// Oldest insertion is evicted; reads do not refresh an entry.
    InsertionOrder,
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(EvictionPolicy::Lru),
            "fifo" | "insertion" | "insertion_order" => Ok(EvictionPolicy::InsertionOrder),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}

/// Result of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key was already cached; the stored value is kept.
    AlreadyPresent,
}

struct Slot<V> {
    value: V,
    stamp: u64,
}

struct Inner<K, V> {
    entries: HashMap<K, Slot<V>>,
    /// stamp → key, oldest first.
    order: BTreeMap<u64, K>,
    next_stamp: u64,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn touch(&mut self, key: &K) {
        let stamp = self.next_stamp;
        if let Some(slot) = self.entries.get_mut(key) {
            self.order.remove(&slot.stamp);
            slot.stamp = stamp;
            self.order.insert(stamp, key.clone());
            self.next_stamp += 1;
        }
    }

    fn evict_oldest(&mut self) -> Option<K> {
        let (_, key) = self.order.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// A capacity-bounded map with an explicit eviction policy.
pub struct BoundedCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl<K: Eq + Hash + Clone, V: Clone> BoundedCache<K, V> {
    /// `capacity` is clamped to at least one entry.
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                next_stamp: 0,
            }),
            capacity: capacity.max(1),
            policy,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.lock();
        let value = inner.entries.get(key).map(|slot| slot.value.clone())?;
        if self.policy == EvictionPolicy::Lru {
            inner.touch(key);
        }
        Some(value)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Inserts `value` unless `key` is already present, evicting as needed.
    /// An existing key is refreshed under `Lru` and left untouched otherwise.
    pub fn insert(&self, key: K, value: V) -> InsertOutcome {
        let mut inner = self.inner.lock();

        if inner.entries.contains_key(&key) {
            if self.policy == EvictionPolicy::Lru {
                inner.touch(&key);
            }
            return InsertOutcome::AlreadyPresent;
        }

        while inner.entries.len() >= self.capacity {
            if inner.evict_oldest().is_none() {
                break;
            }
        }

        let stamp = inner.next_stamp;
        inner.next_stamp += 1;
        inner.order.insert(stamp, key.clone());
        inner.entries.insert(key, Slot { value, stamp });

        InsertOutcome::Inserted
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// The CV cache shared by all requests: content id → parsed CV.
pub type CvCache = BoundedCache<String, Arc<ParsedCv>>;
