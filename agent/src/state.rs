use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::Config;
use rand::Rng;
use tokio::sync::RwLock;

use crate::auth::Authenticator;
use crate::health::HealthMonitor;
use crate::simulator::seed_batch;
use crate::stats::StatsAggregator;
use crate::store::EventStore;

pub type Shared<T> = Arc<RwLock<T>>;

/// Everything the agent mutates, built once in `main` and handed to the simulators and the API.
#[derive(Clone)]
pub struct AppState {
    pub events: Shared<EventStore>,
    pub stats: Shared<StatsAggregator>,
    pub health: Shared<HealthMonitor>,
    pub auth: Arc<Authenticator>,
    pub default_page_size: usize,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(store: EventStore, auth: Authenticator, default_page_size: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(store)),
            stats: Arc::new(RwLock::new(StatsAggregator::default())),
            health: Arc::new(RwLock::new(HealthMonitor::default())),
            auth: Arc::new(auth),
            default_page_size,
            started_at: Utc::now(),
        }
    }

    pub fn from_config<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let batch = seed_batch(rng, config.simulator.seed_events, Utc::now());
        let store = EventStore::seeded(config.simulator.max_events, batch);
        Self::new(store, Authenticator::new(&config.auth), config.agent.default_page_size)
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }
}
