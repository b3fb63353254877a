use chrono::{DateTime, Duration, Utc};
use common::{EventKind, Outcome, SecurityEvent, Severity, SimulatorConfig};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::time::{interval, Duration as TickDuration, MissedTickBehavior};

use crate::state::AppState;

const BADGE_ACCESS_SHARE: f64 = 0.7;
const AUTHORIZED_SHARE: f64 = 0.85;
const BLOCKED_SHARE: f64 = 0.8;

const LOCATIONS: &[&str] = &[
    "Main Entrance",
    "Server Room",
    "Executive Floor",
    "Research Lab",
    "Data Center",
    "Parking Garage",
    "Loading Dock",
    "Lobby",
];

// Documentation address blocks (RFC 5737)
const SOURCE_NETWORKS: &[&str] = &["192.0.2", "198.51.100", "203.0.113"];

/// Consumers of randomness; each gets its own stream so a fixed seed never replays one into another.
#[derive(Debug, Clone, Copy)]
pub enum RngStream {
    SeedBatch = 0,
    EventTick = 1,
    Drift = 2,
}

pub fn rng_for(seed: Option<u64>, stream: RngStream) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ (stream as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
        None => StdRng::from_entropy(),
    }
}

/// Make one synthetic event. Badge reads outnumber attacks roughly 70/30.
pub fn generate_event<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> SecurityEvent {
    let kind = if rng.gen_bool(BADGE_ACCESS_SHARE) {
        EventKind::BadgeAccess
    } else {
        EventKind::DenialOfService
    };

    let outcome = match kind {
        EventKind::BadgeAccess if rng.gen_bool(AUTHORIZED_SHARE) => Outcome::Authorized,
        EventKind::BadgeAccess => Outcome::Unauthorized,
        EventKind::DenialOfService if rng.gen_bool(BLOCKED_SHARE) => Outcome::Blocked,
        EventKind::DenialOfService => Outcome::Detected,
    };

    let severity = severity_for(rng, outcome);

    let (location, card_id, source_address) = match kind {
        EventKind::BadgeAccess => {
            let location = LOCATIONS.choose(rng).map(|l| l.to_string());
            let card = format!("RFID-{:06X}", rng.gen_range(0..0x100_0000u32));
            (location, Some(card), None)
        }
        EventKind::DenialOfService => {
            let network = SOURCE_NETWORKS.choose(rng).copied().unwrap_or("192.0.2");
            let address = format!("{}.{}", network, rng.gen_range(1..255u8));
            (None, None, Some(address))
        }
    };

    // kind and outcome are chosen together above, so they always match
    SecurityEvent {
        id: format!("evt-{:016x}", rng.gen::<u64>()),
        kind,
        outcome,
        occurred_at: now,
        location: None,
        card_id: None,
        source_address: None,
        severity,
        description: String::new(),
    }
    .with_details(location, card_id, source_address)
}

/// Authorized and blocked lean low, unauthorized and detected lean high.
fn severity_for<R: Rng + ?Sized>(rng: &mut R, outcome: Outcome) -> Severity {
    match outcome {
        Outcome::Authorized if rng.gen_bool(0.8) => Severity::Low,
        Outcome::Authorized => Severity::Medium,
        Outcome::Blocked if rng.gen_bool(0.6) => Severity::Low,
        Outcome::Blocked => Severity::Medium,
        Outcome::Unauthorized if rng.gen_bool(0.7) => Severity::High,
        Outcome::Unauthorized => Severity::Critical,
        Outcome::Detected if rng.gen_bool(0.6) => Severity::High,
        Outcome::Detected => Severity::Critical,
    }
}

/// `count` events one minute apart going back from `now`, newest first.
pub fn seed_batch<R: Rng + ?Sized>(rng: &mut R, count: usize, now: DateTime<Utc>) -> Vec<SecurityEvent> {
    (0..count)
        .map(|i| generate_event(rng, now - Duration::minutes(i as i64)))
        .collect()
}

/// Generate one event into the store, trimming it back to capacity.
pub async fn event_tick<R: Rng + ?Sized>(state: &AppState, rng: &mut R) -> SecurityEvent {
    let event = generate_event(rng, Utc::now());
    let mut store = state.events.write().await;
    let dropped = store.push_generated(event.clone());
    debug!(
        "Generated {} event {} ({}), store size {} (dropped {})",
        event.kind,
        event.id,
        event.outcome,
        store.len(),
        dropped
    );
    event
}

/// Drift stats and health gauges once.
pub async fn drift_tick<R: Rng + ?Sized>(state: &AppState, rng: &mut R) {
    state.stats.write().await.drift(rng);
    state.health.write().await.drift(rng);
}

/// Spawn the event and drift loops. Intervals must already be validated as non-zero.
pub fn start_simulators(state: AppState, config: &SimulatorConfig) {
    info!(
        "Starting simulators: events every {}s, drift every {}s, capacity {}",
        config.event_interval_secs, config.drift_interval_secs, config.max_events
    );

    let event_state = state.clone();
    let mut event_rng = rng_for(config.rng_seed, RngStream::EventTick);
    let event_period = TickDuration::from_secs(config.event_interval_secs);
    tokio::spawn(async move {
        let mut ticker = interval(event_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; the seed batch already covers "now"
        ticker.tick().await;
        loop {
            ticker.tick().await;
            event_tick(&event_state, &mut event_rng).await;
        }
    });

    let drift_state = state;
    let mut drift_rng = rng_for(config.rng_seed, RngStream::Drift);
    let drift_period = TickDuration::from_secs(config.drift_interval_secs);
    tokio::spawn(async move {
        let mut ticker = interval(drift_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            drift_tick(&drift_state, &mut drift_rng).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Authenticator;
    use crate::health::{NETWORK_RANGE, READER_RANGE};
    use crate::store::EventStore;
    use common::AuthConfig;

    fn state(capacity: usize) -> AppState {
        AppState::new(EventStore::new(capacity), Authenticator::new(&AuthConfig::default()), 20)
    }

    #[test]
    fn generated_events_are_consistent() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let event = generate_event(&mut rng, Utc::now());
            assert_eq!(event.outcome.kind(), event.kind);
            match event.kind {
                EventKind::BadgeAccess => {
                    assert!(event.card_id.is_some());
                    assert!(event.location.is_some());
                    assert!(event.source_address.is_none());
                }
                EventKind::DenialOfService => {
                    assert!(event.source_address.is_some());
                    assert!(event.card_id.is_none());
                }
            }
            assert!(!event.description.is_empty());
        }
    }

    #[test]
    fn badge_access_dominates() {
        let mut rng = StdRng::seed_from_u64(7);
        let badge = (0..1000)
            .filter(|_| generate_event(&mut rng, Utc::now()).kind == EventKind::BadgeAccess)
            .count();
        assert!((600..800).contains(&badge), "badge = {}", badge);
    }

    #[test]
    fn severity_leans_with_outcome() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..200 {
            assert!(severity_for(&mut rng, Outcome::Authorized) <= Severity::Medium);
            assert!(severity_for(&mut rng, Outcome::Blocked) <= Severity::Medium);
            assert!(severity_for(&mut rng, Outcome::Unauthorized) >= Severity::High);
            assert!(severity_for(&mut rng, Outcome::Detected) >= Severity::High);
        }
    }

    #[test]
    fn seed_batch_is_newest_first() {
        let now = Utc::now();
        let batch = seed_batch(&mut StdRng::seed_from_u64(1), 5, now);
        assert_eq!(batch.len(), 5);
        assert_eq!(batch[0].occurred_at, now);
        assert!(batch.windows(2).all(|w| w[0].occurred_at > w[1].occurred_at));
    }

    #[tokio::test]
    async fn event_tick_adds_one_then_caps() {
        let state = state(100);
        let mut rng = StdRng::seed_from_u64(2);

        event_tick(&state, &mut rng).await;
        assert_eq!(state.events.read().await.len(), 1);

        for _ in 0..150 {
            event_tick(&state, &mut rng).await;
        }
        assert_eq!(state.events.read().await.len(), 100);
    }

    #[tokio::test]
    async fn drift_tick_keeps_gauges_in_range() {
        let state = state(100);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..300 {
            drift_tick(&state, &mut rng).await;
        }
        let health = state.health.read().await.snapshot();
        assert!(READER_RANGE.contains(&health.rfid_readers.percentage));
        assert!(NETWORK_RANGE.contains(&health.network.percentage));

        let stats = state.stats.read().await.snapshot();
        assert!(stats.total_scans >= common::SecurityStats::seed().total_scans);
    }

    #[tokio::test]
    async fn seeded_run_never_repeats_an_id() {
        let mut config = common::Config::default();
        config.simulator.rng_seed = Some(42);
        let state = AppState::from_config(&config, &mut rng_for(config.simulator.rng_seed, RngStream::SeedBatch));

        let mut rng = rng_for(config.simulator.rng_seed, RngStream::EventTick);
        for _ in 0..5 {
            event_tick(&state, &mut rng).await;
        }

        let page = state.events.read().await.list(1, 100);
        let ids: std::collections::HashSet<_> = page.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(page.events.len(), 25);
        assert_eq!(ids.len(), page.events.len());
    }

    #[test]
    fn streams_differ_for_the_same_seed() {
        let now = Utc::now();
        let seeded = generate_event(&mut rng_for(Some(7), RngStream::SeedBatch), now);
        let ticked = generate_event(&mut rng_for(Some(7), RngStream::EventTick), now);
        assert_ne!(seeded.id, ticked.id);
    }
}
