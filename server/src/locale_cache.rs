use pitchside_types::Locale;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Default)]
struct Entries {
    locales: HashMap<u64, Locale>,
    order: VecDeque<u64>,
}

/// Bounded per-user locale cache with FIFO eviction.
///
/// Entries are only ever replaced or dropped explicitly; there is no expiry, so every
/// locale change must go through [`LocaleCache::insert`] or [`LocaleCache::invalidate`].
pub struct LocaleCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl LocaleCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, user_id: u64) -> Option<Locale> {
        self.lock().locales.get(&user_id).copied()
    }

    pub fn insert(&self, user_id: u64, locale: Locale) {
        let mut entries = self.lock();
        if entries.locales.insert(user_id, locale).is_some() {
            return;
        }
        self.admit(&mut entries, user_id);
    }

    /// Caches a locale read from the store unless the user already has an entry, and returns
    /// whichever value is cached afterwards.
    ///
    /// A read can race a locale change; the change always ends with [`LocaleCache::insert`],
    /// so an existing entry is at least as fresh as the value being filled in.
    pub fn fill(&self, user_id: u64, locale: Locale) -> Locale {
        if let Some(cached) = self.get(user_id) {
            return cached;
        }
        let mut entries = self.lock();
        if let Some(cached) = entries.locales.get(&user_id) {
            return *cached;
        }
        entries.locales.insert(user_id, locale);
        self.admit(&mut entries, user_id);
        locale
    }

    /// Records a newly inserted key and evicts the oldest ones past capacity.
    fn admit(&self, entries: &mut Entries, user_id: u64) {
        entries.order.push_back(user_id);
        while entries.order.len() > self.capacity {
            if let Some(evicted) = entries.order.pop_front() {
                entries.locales.remove(&evicted);
            }
        }
    }

    pub fn invalidate(&self, user_id: u64) {
        let mut entries = self.lock();
        if entries.locales.remove(&user_id).is_some() {
            entries.order.retain(|id| *id != user_id);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_first() {
        let cache = LocaleCache::new(2);
        cache.insert(1, Locale::EnUs);
        cache.insert(2, Locale::UkUa);
        cache.insert(1, Locale::CsCz);
        cache.insert(3, Locale::RuRu);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(1), None);
        assert_eq!(cache.get(2), Some(Locale::UkUa));
        assert_eq!(cache.get(3), Some(Locale::RuRu));
    }

    #[test]
    fn test_invalidate() {
        let cache = LocaleCache::new(4);
        cache.insert(1, Locale::EnUs);
        cache.invalidate(1);
        cache.invalidate(9);
        assert!(cache.is_empty());
        assert_eq!(cache.get(1), None);
        cache.insert(1, Locale::CsCz);
        assert_eq!(cache.get(1), Some(Locale::CsCz));
    }

    #[test]
    fn test_fill_never_overwrites_a_newer_entry() {
        let cache = LocaleCache::new(4);
        assert_eq!(cache.fill(1, Locale::UkUa), Locale::UkUa);
        assert_eq!(cache.get(1), Some(Locale::UkUa));

        // A reader fetched UkUa from the store, then a change landed before it filled.
        cache.invalidate(1);
        cache.insert(1, Locale::EnUs);
        assert_eq!(cache.fill(1, Locale::UkUa), Locale::EnUs);
        assert_eq!(cache.get(1), Some(Locale::EnUs));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let cache = LocaleCache::new(0);
        cache.insert(1, Locale::EnUs);
        cache.insert(2, Locale::UkUa);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(2), Some(Locale::UkUa));
    }
}
