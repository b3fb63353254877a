use common::{SecurityStats, StatsPatch, SystemStatus};
use log::debug;
use rand::Rng;

const SCAN_PROBABILITY: f64 = 0.3;
const AUTHORIZED_SHARE: f64 = 0.9;
const ATTACK_PROBABILITY: f64 = 0.1;

/// Running security counters. Maintained independently of the event log.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    stats: SecurityStats,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(SecurityStats::seed())
    }
}

impl StatsAggregator {
    pub fn new(stats: SecurityStats) -> Self {
        Self { stats }
    }

    pub fn snapshot(&self) -> SecurityStats {
        self.stats.clone()
    }

    /// Overwrite every counter present in `patch`; absent counters keep their value.
    pub fn apply(&mut self, patch: &StatsPatch) -> SecurityStats {
        let stats = &mut self.stats;
        if let Some(v) = patch.total_scans {
            stats.total_scans = v;
        }
        if let Some(v) = patch.authorized_access {
            stats.authorized_access = v;
        }
        if let Some(v) = patch.unauthorized_attempts {
            stats.unauthorized_attempts = v;
        }
        if let Some(v) = patch.dos_attacks {
            stats.dos_attacks = v;
        }
        if let Some(v) = patch.active_threats {
            stats.active_threats = v;
        }
        self.refresh_status();
        self.snapshot()
    }

    /// Random increments; most calls change nothing. Returns whether any counter moved.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let mut changed = false;

        if rng.gen_bool(SCAN_PROBABILITY) {
            let scans: u64 = rng.gen_range(1..=3);
            self.stats.total_scans = self.stats.total_scans.saturating_add(scans);
            if rng.gen_bool(AUTHORIZED_SHARE) {
                self.stats.authorized_access = self.stats.authorized_access.saturating_add(scans);
            } else {
                self.stats.unauthorized_attempts = self.stats.unauthorized_attempts.saturating_add(scans);
            }
            debug!("Stats drift: +{} scans", scans);
            changed = true;
        }

        if rng.gen_bool(ATTACK_PROBABILITY) {
            self.stats.dos_attacks = self.stats.dos_attacks.saturating_add(1);
            debug!("Stats drift: +1 attack");
            changed = true;
        }

        if changed {
            self.refresh_status();
        }
        changed
    }

    fn refresh_status(&mut self) {
        self.stats.system_status = SystemStatus::from_active_threats(self.stats.active_threats);
    }
}
