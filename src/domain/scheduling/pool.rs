//! Shared slot pool of one conversation.
//!
//! Tracks which slots are free to offer (`available`), held by exactly one
//! interviewee (`reserved`), booked (`scheduled`), and which interviewees have
//! turned each slot down. A slot key lives in at most one of `available` and
//! `reserved`; once scheduled it never returns to either.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::ParticipantId;

use super::{Slot, SlotKey};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotPool {
    available: Vec<Slot>,
    reserved: Vec<Slot>,
    scheduled: Vec<Slot>,
    denials: BTreeMap<SlotKey, BTreeSet<ParticipantId>>,
}

impl SlotPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots free to offer, in insertion order.
    pub fn available(&self) -> &[Slot] {
        &self.available
    }

    pub fn reserved(&self) -> &[Slot] {
        &self.reserved
    }

    pub fn scheduled(&self) -> &[Slot] {
        &self.scheduled
    }

    pub fn denials(&self) -> &BTreeMap<SlotKey, BTreeSet<ParticipantId>> {
        &self.denials
    }

    pub fn denials_for(&self, key: &SlotKey) -> Option<&BTreeSet<ParticipantId>> {
        self.denials.get(key)
    }

    pub fn is_available(&self, key: &SlotKey) -> bool {
        self.available.iter().any(|s| s.key() == *key)
    }

    pub fn is_reserved(&self, key: &SlotKey) -> bool {
        self.reserved.iter().any(|s| s.key() == *key)
    }

    /// True if the key is anywhere in the pool, booked slots included.
    pub fn knows(&self, key: &SlotKey) -> bool {
        self.is_available(key)
            || self.is_reserved(key)
            || self.scheduled.iter().any(|s| s.key() == *key)
    }

    /// Earliest available slot the participant has not been offered yet.
    ///
    /// Ties on start time cannot occur between distinct slots since the key
    /// is the start, so insertion order only matters for equal keys, which
    /// `publish` never admits.
    pub fn earliest_untried(&self, offered: &[SlotKey]) -> Option<Slot> {
        self.available
            .iter()
            .filter(|s| !offered.contains(&s.key()))
            .min_by_key(|s| s.start)
            .copied()
    }

    pub fn has_untried(&self, offered: &[SlotKey]) -> bool {
        self.available.iter().any(|s| !offered.contains(&s.key()))
    }

    /// Adds slots to `available`, skipping keys the pool already knows.
    ///
    /// Returns how many were added.
    pub fn publish(&mut self, slots: impl IntoIterator<Item = Slot>) -> usize {
        let mut added = 0;
        for slot in slots {
            if !self.knows(&slot.key()) {
                self.available.push(slot);
                added += 1;
            }
        }
        added
    }

    /// Removes the given keys from `available`. Held and booked slots stay.
    pub fn withdraw(&mut self, keys: &[SlotKey]) -> usize {
        let before = self.available.len();
        self.available.retain(|s| !keys.contains(&s.key()));
        before - self.available.len()
    }

    /// Moves a slot from `available` to `reserved`.
    pub fn reserve(&mut self, key: &SlotKey) -> Option<Slot> {
        let index = self.available.iter().position(|s| s.key() == *key)?;
        let slot = self.available.remove(index);
        self.reserved.push(slot);
        Some(slot)
    }

    /// Moves a held slot back to `available` so others can be offered it.
    pub fn release(&mut self, key: &SlotKey) -> Option<Slot> {
        let index = self.reserved.iter().position(|s| s.key() == *key)?;
        let slot = self.reserved.remove(index);
        if !self.is_available(key) {
            self.available.push(slot);
        }
        Some(slot)
    }

    /// Books a slot: removes it from `reserved` and `available` for good.
    pub fn commit(&mut self, slot: Slot) {
        let key = slot.key();
        self.reserved.retain(|s| s.key() != key);
        self.available.retain(|s| s.key() != key);
        self.scheduled.push(slot);
    }

    pub fn record_denial(&mut self, key: SlotKey, participant: ParticipantId) {
        self.denials.entry(key).or_default().insert(participant);
    }

    /// True if every currently-unscheduled interviewee has declined the slot.
    pub fn is_denied_by_all(&self, key: &SlotKey, unscheduled: &BTreeSet<ParticipantId>) -> bool {
        if unscheduled.is_empty() {
            return false;
        }
        self.denials
            .get(key)
            .map(|deniers| deniers.is_superset(unscheduled))
            .unwrap_or(false)
    }

    /// Permanently drops available slots declined by the whole unscheduled set.
    pub fn prune_denied(&mut self, unscheduled: &BTreeSet<ParticipantId>) -> Vec<SlotKey> {
        let doomed: Vec<SlotKey> = self
            .available
            .iter()
            .map(Slot::key)
            .filter(|key| self.is_denied_by_all(key, unscheduled))
            .collect();
        if !doomed.is_empty() {
            self.withdraw(&doomed);
        }
        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use chrono::{TimeZone, Utc};

    fn slot(hour: u32) -> Slot {
        let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 6, hour, 0, 0).unwrap());
        Slot::new(start, start.plus_minutes(60)).unwrap()
    }

    fn pid(n: &str) -> ParticipantId {
        ParticipantId::from_phone(n).unwrap()
    }

    #[test]
    fn publish_skips_known_keys() {
        let mut pool = SlotPool::new();
        assert_eq!(pool.publish([slot(9), slot(10)]), 2);
        pool.reserve(&slot(9).key());
        pool.commit(slot(10));

        assert_eq!(pool.publish([slot(9), slot(10), slot(11)]), 1);
        assert_eq!(pool.available(), &[slot(11)]);
    }

    #[test]
    fn earliest_untried_prefers_start_time_over_insertion() {
        let mut pool = SlotPool::new();
        pool.publish([slot(14), slot(9), slot(11)]);

        assert_eq!(pool.earliest_untried(&[]), Some(slot(9)));
        assert_eq!(pool.earliest_untried(&[slot(9).key()]), Some(slot(11)));
    }

    #[test]
    fn reserve_and_release_keep_key_in_one_set() {
        let mut pool = SlotPool::new();
        pool.publish([slot(9)]);

        pool.reserve(&slot(9).key());
        assert!(!pool.is_available(&slot(9).key()));
        assert!(pool.is_reserved(&slot(9).key()));

        pool.release(&slot(9).key());
        assert!(pool.is_available(&slot(9).key()));
        assert!(!pool.is_reserved(&slot(9).key()));
    }

    #[test]
    fn commit_removes_from_everywhere_but_scheduled() {
        let mut pool = SlotPool::new();
        pool.publish([slot(9)]);
        pool.reserve(&slot(9).key());
        pool.commit(slot(9));

        assert!(pool.available().is_empty());
        assert!(pool.reserved().is_empty());
        assert_eq!(pool.scheduled(), &[slot(9)]);
    }

    #[test]
    fn denied_by_all_requires_superset_of_unscheduled() {
        let mut pool = SlotPool::new();
        pool.publish([slot(9)]);
        let key = slot(9).key();
        let unscheduled: BTreeSet<_> = [pid("+1"), pid("+2")].into_iter().collect();

        pool.record_denial(key, pid("+1"));
        assert!(!pool.is_denied_by_all(&key, &unscheduled));
        assert!(pool.prune_denied(&unscheduled).is_empty());

        pool.record_denial(key, pid("+2"));
        assert!(pool.is_denied_by_all(&key, &unscheduled));
        assert_eq!(pool.prune_denied(&unscheduled), vec![key]);
        assert!(pool.available().is_empty());
    }

    #[test]
    fn empty_unscheduled_set_never_prunes() {
        let mut pool = SlotPool::new();
        pool.publish([slot(9)]);
        pool.record_denial(slot(9).key(), pid("+1"));
        assert!(pool.prune_denied(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn withdraw_leaves_reserved_slots_alone() {
        let mut pool = SlotPool::new();
        pool.publish([slot(9), slot(10)]);
        pool.reserve(&slot(9).key());

        assert_eq!(pool.withdraw(&[slot(9).key(), slot(10).key()]), 1);
        assert!(pool.is_reserved(&slot(9).key()));
    }

    #[test]
    fn denials_serialize_deterministically() {
        let mut pool = SlotPool::new();
        pool.publish([slot(9)]);
        pool.record_denial(slot(9).key(), pid("+2"));
        pool.record_denial(slot(9).key(), pid("+1"));

        let json = serde_json::to_string(&pool).unwrap();
        let back: SlotPool = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pool);
        assert!(json.contains("[\"+1\",\"+2\"]"));
    }
}
