use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BadgeAccess,
    DenialOfService,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BadgeAccess => "badge-access",
            EventKind::DenialOfService => "denial-of-service",
        }
    }

    /// Outcomes an event of this kind may carry.
    pub fn outcomes(&self) -> &'static [Outcome] {
        match self {
            EventKind::BadgeAccess => &[Outcome::Authorized, Outcome::Unauthorized],
            EventKind::DenialOfService => &[Outcome::Blocked, Outcome::Detected],
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "badge-access" | "rfid" => Ok(EventKind::BadgeAccess),
            "denial-of-service" | "dos" => Ok(EventKind::DenialOfService),
            _ => Err(ValidationError::InvalidValue { field: "kind", value: s.to_string() }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Authorized,
    Unauthorized,
    Blocked,
    Detected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Authorized => "authorized",
            Outcome::Unauthorized => "unauthorized",
            Outcome::Blocked => "blocked",
            Outcome::Detected => "detected",
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Outcome::Authorized | Outcome::Unauthorized => EventKind::BadgeAccess,
            Outcome::Blocked | Outcome::Detected => EventKind::DenialOfService,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authorized" => Ok(Outcome::Authorized),
            "unauthorized" => Ok(Outcome::Unauthorized),
            "blocked" => Ok(Outcome::Blocked),
            "detected" => Ok(Outcome::Detected),
            _ => Err(ValidationError::InvalidValue { field: "outcome", value: s.to_string() }),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(ValidationError::InvalidValue { field: "severity", value: s.to_string() }),
        }
    }
}

/// One badge read or denial-of-service occurrence.
///
/// Built through [`SecurityEvent::new`] or [`EventSubmission::into_event`], both of
/// which refuse an outcome that does not belong to the event's kind.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub id: String,
    pub kind: EventKind,
    pub outcome: Outcome,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
    pub severity: Severity,
    pub description: String,
}

impl SecurityEvent {
    pub fn new(kind: EventKind, outcome: Outcome, occurred_at: DateTime<Utc>) -> Result<Self, ValidationError> {
        if outcome.kind() != kind {
            return Err(ValidationError::OutcomeMismatch { kind, outcome });
        }
        let mut event = Self {
            id: Uuid::new_v4().to_string(),
            kind,
            outcome,
            occurred_at,
            location: None,
            card_id: None,
            source_address: None,
            severity: Severity::default(),
            description: String::new(),
        };
        event.description = event.describe();
        Ok(event)
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Attach the descriptive fields. Fields that do not apply to the event's kind are dropped.
    pub fn with_details(mut self, location: Option<String>, card_id: Option<String>, source_address: Option<String>) -> Self {
        match self.kind {
            EventKind::BadgeAccess => {
                self.location = location;
                self.card_id = card_id;
            }
            EventKind::DenialOfService => {
                self.source_address = source_address;
            }
        }
        self.description = self.describe();
        self
    }

    pub fn is_threat(&self) -> bool {
        matches!(self.outcome, Outcome::Unauthorized | Outcome::Detected)
    }

    fn describe(&self) -> String {
        let card = self.card_id.as_deref().unwrap_or("unknown card");
        let location = self.location.as_deref().unwrap_or("unknown location");
        let source = self.source_address.as_deref().unwrap_or("unknown source");
        match self.outcome {
            Outcome::Authorized => format!("Access granted to {} at {}", card, location),
            Outcome::Unauthorized => format!("Access denied to {} at {}", card, location),
            Outcome::Blocked => format!("DoS attack from {} blocked", source),
            Outcome::Detected => format!("DoS attack from {} detected", source),
        }
    }
}

/// Partial event as accepted from callers. Unknown fields are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, alias = "status", skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, alias = "timestamp", skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EventSubmission {
    pub fn new(kind: EventKind, outcome: Outcome) -> Self {
        Self {
            kind: Some(kind.as_str().to_string()),
            outcome: Some(outcome.as_str().to_string()),
            ..Default::default()
        }
    }

    /// Validate and fill in the generated fields (`id`, `occurredAt`, `severity`).
    pub fn into_event(self, now: DateTime<Utc>) -> Result<SecurityEvent, ValidationError> {
        let kind: EventKind = self
            .kind
            .as_deref()
            .ok_or(ValidationError::MissingField("kind"))?
            .parse()?;
        let outcome: Outcome = self
            .outcome
            .as_deref()
            .ok_or(ValidationError::MissingField("outcome"))?
            .parse()?;
        let severity = match self.severity.as_deref() {
            Some(raw) => raw.parse()?,
            None => Severity::default(),
        };

        let mut event = SecurityEvent::new(kind, outcome, self.occurred_at.unwrap_or(now))?
            .with_severity(severity)
            .with_details(self.location, self.card_id, self.source_address);

        if let Some(id) = self.id.filter(|id| !id.trim().is_empty()) {
            event.id = id;
        }
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            event.description = description;
        }
        Ok(event)
    }
}

/// One page of the event log, newest first. `total` is the size of the whole log.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventPage {
    pub events: Vec<SecurityEvent>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Operational,
    Warning,
    Critical,
}

impl SystemStatus {
    pub fn from_active_threats(active_threats: u64) -> Self {
        match active_threats {
            0..=2 => SystemStatus::Operational,
            3..=5 => SystemStatus::Warning,
            _ => SystemStatus::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemStatus::Operational => "operational",
            SystemStatus::Warning => "warning",
            SystemStatus::Critical => "critical",
        }
    }
}

/// Process-lifetime counters. Not reconciled with the event log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStats {
    pub total_scans: u64,
    pub authorized_access: u64,
    pub unauthorized_attempts: u64,
    pub dos_attacks: u64,
    pub active_threats: u64,
    pub system_status: SystemStatus,
}

impl SecurityStats {
    pub fn seed() -> Self {
        Self {
            total_scans: 1247,
            authorized_access: 1189,
            unauthorized_attempts: 58,
            dos_attacks: 23,
            active_threats: 2,
            system_status: SystemStatus::from_active_threats(2),
        }
    }
}

/// Overwrites for the numeric counters in [`SecurityStats`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_scans: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_access: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unauthorized_attempts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dos_attacks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_threats: Option<u64>,
}

impl StatsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReaderStatus {
    Online,
    Degraded,
    Offline,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProtectionStatus {
    Active,
    Inactive,
    Maintenance,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageStatus {
    Operational,
    Degraded,
    Down,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NetworkLoad {
    Normal,
    Moderate,
    High,
    Critical,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gauge<S> {
    pub status: S,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReaderFleet {
    pub status: ReaderStatus,
    pub online: u32,
    pub total: u32,
    pub percentage: f64,
}

/// Gauges for the four monitored subsystems. Statuses are set independently of the percentages.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub rfid_readers: ReaderFleet,
    pub dos_protection: Gauge<ProtectionStatus>,
    pub database: Gauge<StorageStatus>,
    pub network: Gauge<NetworkLoad>,
}

impl SystemHealth {
    pub fn seed() -> Self {
        Self {
            rfid_readers: ReaderFleet { status: ReaderStatus::Online, online: 47, total: 48, percentage: 97.9 },
            dos_protection: Gauge { status: ProtectionStatus::Active, percentage: 98.5 },
            database: Gauge { status: StorageStatus::Operational, percentage: 99.2 },
            network: Gauge { status: NetworkLoad::Normal, percentage: 78.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_submission_gets_generated_fields() {
        let now = Utc::now();
        let event = EventSubmission::new(EventKind::BadgeAccess, Outcome::Authorized)
            .into_event(now)
            .unwrap();

        assert!(!event.id.is_empty());
        assert_eq!(event.occurred_at, now);
        assert_eq!(event.severity, Severity::Medium);
        assert_eq!(event.kind, EventKind::BadgeAccess);
        assert_eq!(event.outcome, Outcome::Authorized);
    }

    #[test]
    fn missing_kind_or_outcome_is_rejected() {
        let no_kind = EventSubmission { outcome: Some("authorized".into()), ..Default::default() };
        assert_eq!(no_kind.into_event(Utc::now()).unwrap_err(), ValidationError::MissingField("kind"));

        let no_outcome = EventSubmission { kind: Some("badge-access".into()), ..Default::default() };
        assert_eq!(no_outcome.into_event(Utc::now()).unwrap_err(), ValidationError::MissingField("outcome"));
    }

    #[test]
    fn outcome_must_belong_to_kind() {
        let err = EventSubmission::new(EventKind::BadgeAccess, Outcome::Blocked)
            .into_event(Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutcomeMismatch { kind: EventKind::BadgeAccess, outcome: Outcome::Blocked }
        );

        for kind in [EventKind::BadgeAccess, EventKind::DenialOfService] {
            for outcome in kind.outcomes() {
                assert_eq!(outcome.kind(), kind);
            }
        }
    }

    #[test]
    fn unknown_severity_is_a_validation_error() {
        let submission = EventSubmission {
            severity: Some("apocalyptic".into()),
            ..EventSubmission::new(EventKind::DenialOfService, Outcome::Detected)
        };
        let err = submission.into_event(Utc::now()).unwrap_err();
        assert_eq!(err.field(), "severity");
    }

    #[test]
    fn fields_of_the_other_kind_are_dropped() {
        let submission = EventSubmission {
            card_id: Some("RFID-00AA11".into()),
            source_address: Some("203.0.113.9".into()),
            ..EventSubmission::new(EventKind::DenialOfService, Outcome::Blocked)
        };
        let event = submission.into_event(Utc::now()).unwrap();
        assert_eq!(event.card_id, None);
        assert_eq!(event.source_address.as_deref(), Some("203.0.113.9"));
        assert!(event.description.contains("203.0.113.9"));
    }

    #[test]
    fn submission_accepts_legacy_field_names() {
        let json = r#"{"type":"rfid","status":"unauthorized","location":"Lobby","extra":1}"#;
        let submission: EventSubmission = serde_json::from_str(json).unwrap();
        let event = submission.into_event(Utc::now()).unwrap();
        assert_eq!(event.kind, EventKind::BadgeAccess);
        assert_eq!(event.outcome, Outcome::Unauthorized);
        assert_eq!(event.location.as_deref(), Some("Lobby"));
    }

    #[test]
    fn event_serializes_with_camel_case_fields() {
        let event = SecurityEvent::new(EventKind::BadgeAccess, Outcome::Authorized, Utc::now())
            .unwrap()
            .with_details(Some("Server Room".into()), Some("RFID-123456".into()), None);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "badge-access");
        assert_eq!(value["cardId"], "RFID-123456");
        assert!(value.get("occurredAt").is_some());
        assert!(value.get("sourceAddress").is_none());
    }

    #[test]
    fn status_tracks_active_threats() {
        assert_eq!(SystemStatus::from_active_threats(0), SystemStatus::Operational);
        assert_eq!(SystemStatus::from_active_threats(3), SystemStatus::Warning);
        assert_eq!(SystemStatus::from_active_threats(6), SystemStatus::Critical);
        assert_eq!(SecurityStats::seed().system_status, SystemStatus::Operational);
    }

    #[test]
    fn stats_patch_ignores_unknown_fields() {
        let patch: StatsPatch = serde_json::from_str(r#"{"dosAttacks":5,"bogus":true}"#).unwrap();
        assert_eq!(patch, StatsPatch { dos_attacks: Some(5), ..Default::default() });
        assert!(!patch.is_empty());
        assert!(StatsPatch::default().is_empty());
    }
}
