use std::ops::RangeInclusive;

use common::SystemHealth;
use rand::Rng;

pub const READER_RANGE: RangeInclusive<f64> = 95.0..=100.0;
pub const PROTECTION_RANGE: RangeInclusive<f64> = 95.0..=100.0;
pub const DATABASE_RANGE: RangeInclusive<f64> = 90.0..=100.0;
pub const NETWORK_RANGE: RangeInclusive<f64> = 60.0..=95.0;

/// Largest step a gauge moves per drift tick, in percentage points.
const MAX_STEP: f64 = 1.0;

/// Subsystem gauges doing a clamped random walk.
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    health: SystemHealth,
    // unrounded reader availability; the published figure is derived from whole readers
    reader_level: f64,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new(SystemHealth::seed())
    }
}

impl HealthMonitor {
    pub fn new(health: SystemHealth) -> Self {
        let reader_level = health.rfid_readers.percentage;
        Self { health, reader_level }
    }

    pub fn snapshot(&self) -> SystemHealth {
        self.health.clone()
    }

    /// Nudge every gauge and clamp it back into its range. Statuses are left alone.
    pub fn drift<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.reader_level = nudge(self.reader_level, rng.gen_range(-MAX_STEP..=MAX_STEP), &READER_RANGE);
        let readers = &mut self.health.rfid_readers;
        readers.online = online_readers(self.reader_level, readers.total);
        readers.percentage = reader_percentage(readers.online, readers.total);

        let protection = &mut self.health.dos_protection;
        protection.percentage = nudge(protection.percentage, rng.gen_range(-MAX_STEP..=MAX_STEP), &PROTECTION_RANGE);

        let database = &mut self.health.database;
        database.percentage = nudge(database.percentage, rng.gen_range(-MAX_STEP..=MAX_STEP), &DATABASE_RANGE);

        let network = &mut self.health.network;
        network.percentage = nudge(network.percentage, rng.gen_range(-MAX_STEP..=MAX_STEP), &NETWORK_RANGE);
    }
}

fn nudge(value: f64, delta: f64, range: &RangeInclusive<f64>) -> f64 {
    round1((value + delta).clamp(*range.start(), *range.end()))
}

/// Whole readers online for `level`, never fewer than the count that keeps the fleet at its floor.
fn online_readers(level: f64, total: u32) -> u32 {
    let total_f = total as f64;
    let floor = (total_f * *READER_RANGE.start() / 100.0).ceil();
    (total_f * level / 100.0).round().clamp(floor.min(total_f), total_f) as u32
}

fn reader_percentage(online: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(online as f64 / total as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
