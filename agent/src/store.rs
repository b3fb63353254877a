use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use common::{EventKind, EventPage, EventSubmission, SecurityEvent, ValidationError};
use log::debug;
use serde::Serialize;

/// Bounded event log, newest first.
///
/// Only generated events trigger a trim; explicit submissions may push the log past
/// `capacity` until the next generated event arrives.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: VecDeque<SecurityEvent>,
    capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventCounts {
    pub badge_access: usize,
    pub denial_of_service: usize,
    pub threats: usize,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a store from an initial batch ordered newest first.
    pub fn seeded(capacity: usize, batch: Vec<SecurityEvent>) -> Self {
        let mut store = Self::new(capacity);
        store.events.extend(batch);
        store.trim();
        store
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Page through the log. `page` is 1-based; a page past the end is empty, not an error.
    pub fn list(&self, page: usize, limit: usize) -> EventPage {
        let page = page.max(1);
        let limit = limit.max(1);
        let start = (page - 1).saturating_mul(limit);

        let events = self.events.iter().skip(start).take(limit).cloned().collect();

        EventPage {
            events,
            total: self.events.len(),
            page,
            limit,
        }
    }

    /// Validate and insert a caller-supplied event at the front. Does not trim.
    pub fn submit(&mut self, submission: EventSubmission, now: DateTime<Utc>) -> Result<SecurityEvent, ValidationError> {
        let event = submission.into_event(now)?;
        self.events.push_front(event.clone());
        Ok(event)
    }

    /// Insert a generated event and trim back to capacity. Returns how many old events were dropped.
    pub fn push_generated(&mut self, event: SecurityEvent) -> usize {
        self.events.push_front(event);
        self.trim()
    }

    /// Drop the oldest events beyond capacity.
    pub fn trim(&mut self) -> usize {
        let excess = self.events.len().saturating_sub(self.capacity);
        if excess > 0 {
            self.events.truncate(self.capacity);
            debug!("Trimmed {} events (capacity {})", excess, self.capacity);
        }
        excess
    }

    pub fn counts(&self) -> EventCounts {
        self.events.iter().fold(EventCounts::default(), |mut counts, event| {
            match event.kind {
                EventKind::BadgeAccess => counts.badge_access += 1,
                EventKind::DenialOfService => counts.denial_of_service += 1,
            }
            if event.is_threat() {
                counts.threats += 1;
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use common::{Outcome, Severity};
    use proptest::prelude::*;

    fn badge(outcome: Outcome, at: DateTime<Utc>) -> EventSubmission {
        EventSubmission {
            occurred_at: Some(at),
            ..EventSubmission::new(EventKind::BadgeAccess, outcome)
        }
    }

    fn generated(at: DateTime<Utc>) -> SecurityEvent {
        SecurityEvent::new(EventKind::DenialOfService, Outcome::Blocked, at).unwrap()
    }

    #[test]
    fn newest_submissions_come_first() {
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(1);
        let t3 = t2 + Duration::seconds(1);

        let mut store = EventStore::new(100);
        store.submit(badge(Outcome::Authorized, t1), Utc::now()).unwrap();
        store.submit(badge(Outcome::Unauthorized, t2), Utc::now()).unwrap();
        store.submit(badge(Outcome::Authorized, t3), Utc::now()).unwrap();

        let page = store.list(1, 2);
        assert_eq!(page.total, 3);
        assert_eq!(page.events.len(), 2);
        assert_eq!(page.events[0].occurred_at, t3);
        assert_eq!(page.events[1].occurred_at, t2);
        assert_eq!(page.events[1].outcome, Outcome::Unauthorized);
    }

    #[test]
    fn submit_fills_defaults() {
        let now = Utc::now();
        let mut store = EventStore::new(100);
        let event = store
            .submit(EventSubmission::new(EventKind::BadgeAccess, Outcome::Authorized), now)
            .unwrap();

        assert!(!event.id.is_empty());
        assert_eq!(event.occurred_at, now);
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(store.list(1, 1).events[0], event);
    }

    #[test]
    fn rejected_submission_leaves_store_untouched() {
        let mut store = EventStore::seeded(100, vec![generated(Utc::now())]);
        let missing_kind = EventSubmission {
            outcome: Some("authorized".into()),
            ..Default::default()
        };

        assert!(store.submit(missing_kind, Utc::now()).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let store = EventStore::seeded(100, vec![generated(Utc::now()); 3]);
        let page = store.list(5, 20);
        assert!(page.events.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.page, 5);
    }

    #[test]
    fn zero_page_and_limit_are_raised_to_one() {
        let store = EventStore::seeded(100, vec![generated(Utc::now()); 3]);
        let page = store.list(0, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
        assert_eq!(page.events.len(), 1);
    }

    #[test]
    fn submissions_may_exceed_capacity_until_next_generated_event() {
        let mut store = EventStore::new(3);
        for _ in 0..5 {
            store
                .submit(EventSubmission::new(EventKind::BadgeAccess, Outcome::Authorized), Utc::now())
                .unwrap();
        }
        assert_eq!(store.len(), 5);

        let newest = generated(Utc::now());
        let dropped = store.push_generated(newest.clone());
        assert_eq!(dropped, 3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.list(1, 1).events[0], newest);
    }

    #[test]
    fn generated_events_grow_by_one_until_capped() {
        let mut store = EventStore::new(100);
        for i in 0..250 {
            let before = store.len();
            store.push_generated(generated(Utc::now()));
            if i < 100 {
                assert_eq!(store.len(), before + 1);
            }
            assert!(store.len() <= 100);
        }
        assert_eq!(store.len(), 100);
    }

    #[test]
    fn counts_split_by_kind_and_threat() {
        let mut store = EventStore::new(100);
        let now = Utc::now();
        store.submit(badge(Outcome::Authorized, now), now).unwrap();
        store.submit(badge(Outcome::Unauthorized, now), now).unwrap();
        store
            .submit(EventSubmission::new(EventKind::DenialOfService, Outcome::Detected), now)
            .unwrap();

        assert_eq!(
            store.counts(),
            EventCounts { badge_access: 2, denial_of_service: 1, threats: 2 }
        );
    }

    proptest! {
        #[test]
        fn pages_never_exceed_limit(size in 0usize..150, page in 1usize..20, limit in 1usize..50) {
            let store = EventStore::seeded(200, vec![generated(Utc::now()); size]);
            let result = store.list(page, limit);
            prop_assert!(result.events.len() <= limit);
            prop_assert_eq!(result.total, size);
        }
    }
}
