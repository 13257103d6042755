/// Last-value cache replayed to late joiners
///
/// Written concurrently by the read loop of any connection and read by
/// the dispatch loop during replay, so it lives behind its own
/// reader/writer lock rather than inside the dispatch loop's state.
use parking_lot::RwLock;

use super::message::{Category, REPLAY_ORDER};
use super::Payload;

#[derive(Debug, Default)]
pub struct SnapshotCache {
    slots: RwLock<[Option<Payload>; 6]>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite one slot (last write wins, no history)
    pub fn set_last(&self, category: Category, payload: Payload) {
        self.slots.write()[category.index()] = Some(payload);
    }

    /// Current payload of one slot
    pub fn get(&self, category: Category) -> Option<Payload> {
        self.slots.read()[category.index()].clone()
    }

    /// Populated slots in replay order
    ///
    /// Clones the handles under the read lock so delivery happens with the
    /// lock released.
    pub fn replay(&self) -> Vec<(Category, Payload)> {
        let slots = self.slots.read();
        REPLAY_ORDER
            .iter()
            .filter_map(|category| {
                slots[category.index()]
                    .as_ref()
                    .map(|payload| (*category, payload.clone()))
            })
            .collect()
    }

    /// Which slots hold a value, in replay order
    pub fn populated(&self) -> Vec<(Category, bool)> {
        let slots = self.slots.read();
        REPLAY_ORDER
            .iter()
            .map(|category| (*category, slots[category.index()].is_some()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn payload(s: &str) -> Payload {
        Payload::from(s.as_bytes())
    }

    #[test]
    fn test_empty_cache_replays_nothing() {
        let cache = SnapshotCache::new();
        assert!(cache.replay().is_empty());
        assert!(cache.populated().iter().all(|(_, set)| !set));
    }

    #[test]
    fn test_replay_uses_fixed_order() {
        let cache = SnapshotCache::new();
        cache.set_last(Category::Cover, payload("cover"));
        cache.set_last(Category::Verse, payload("verse"));
        cache.set_last(Category::LiveStatus, payload("live"));
        cache.set_last(Category::Scene, payload("scene"));

        let order: Vec<Category> = cache.replay().into_iter().map(|(c, _)| c).collect();
        assert_eq!(
            order,
            vec![
                Category::LiveStatus,
                Category::Scene,
                Category::Verse,
                Category::Cover
            ]
        );
    }

    #[test]
    fn test_last_write_wins_per_slot() {
        let cache = SnapshotCache::new();
        cache.set_last(Category::Scene, payload("p1"));
        cache.set_last(Category::Lyrics, payload("lyrics"));
        cache.set_last(Category::Scene, payload("p2"));

        assert_eq!(cache.get(Category::Scene).as_deref(), Some(&b"p2"[..]));
        assert_eq!(cache.get(Category::Lyrics).as_deref(), Some(&b"lyrics"[..]));
        assert_eq!(cache.replay().len(), 2);
    }

    #[test]
    fn test_concurrent_writers_on_independent_slots() {
        let cache = Arc::new(SnapshotCache::new());
        let handles: Vec<_> = REPLAY_ORDER
            .iter()
            .map(|category| {
                let cache = cache.clone();
                let category = *category;
                std::thread::spawn(move || {
                    for i in 0..200 {
                        cache.set_last(category, payload(&format!("{}-{}", category, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for (category, value) in cache.replay() {
            assert_eq!(&value[..], format!("{}-199", category).as_bytes());
        }
    }
}
