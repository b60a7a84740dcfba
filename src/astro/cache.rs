//! Bounded memoization cache for the ephemeris position functions.
//!
//! Positions are memoized by the exact Julian Date bit pattern so repeated
//! queries for the same instant (a search sweep re-enriching a catalog, the
//! scheduler re-scoring candidates) skip recomputation. The cache is
//! capacity-bounded with oldest-entry eviction, so a long-running session
//! cannot grow it without limit. Entries are idempotent: the same key always
//! maps to the same value, so a racing duplicate insert is only redundant
//! work, never corruption.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

pub(crate) struct PositionCache<V> {
    capacity: usize,
    state: Mutex<Option<CacheState<V>>>,
}

struct CacheState<V> {
    map: HashMap<u64, V>,
    order: VecDeque<u64>,
}

impl<V: Copy> PositionCache<V> {
    pub(crate) const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(None),
        }
    }

    /// Look up the value for `jd`, computing and inserting it on a miss.
    ///
    /// The computation runs outside the lock.
    pub(crate) fn get_or_compute<F>(&self, jd: f64, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        let key = jd.to_bits();

        {
            let mut guard = self.state.lock();
            if let Some(state) = guard.as_mut() {
                if let Some(value) = state.map.get(&key) {
                    return *value;
                }
            }
        }

        let value = compute();

        let mut guard = self.state.lock();
        let state = guard.get_or_insert_with(|| CacheState {
            map: HashMap::new(),
            order: VecDeque::new(),
        });

        if !state.map.contains_key(&key) {
            while state.map.len() >= self.capacity {
                match state.order.pop_front() {
                    Some(oldest) => {
                        state.map.remove(&oldest);
                    }
                    None => break,
                }
            }
            state.map.insert(key, value);
            state.order.push_back(key);
        }

        value
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state.lock().as_ref().map_or(0, |s| s.map.len())
    }
}
