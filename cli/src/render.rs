use colored::*;
use common::{
    EventKind, EventPage, NetworkLoad, Outcome, ProtectionStatus, ReaderStatus, SecurityEvent, SecurityStats,
    Severity, StorageStatus, SystemHealth, SystemStatus,
};
use serde_json::Value;

const WIDTH: usize = 62;

fn rule(left: &str, right: &str) -> String {
    format!("{}{}{}", left, "═".repeat(WIDTH), right)
}

fn title(text: &str) -> String {
    format!("║{:^width$}║", text, width = WIDTH)
}

fn row(label: &str, value: ColoredString) {
    let label = format!(" {:<22}", label);
    let pad = WIDTH.saturating_sub(label.chars().count() + value.chars().count());
    println!("{}{}{}{}{}", "║".bright_cyan(), label.bright_cyan(), value, " ".repeat(pad), "║".bright_cyan());
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::BrightRed,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::Blue,
    }
}

fn outcome_label(outcome: Outcome) -> ColoredString {
    match outcome {
        Outcome::Authorized => "authorized".bright_green(),
        Outcome::Blocked => "blocked".bright_green(),
        Outcome::Unauthorized => "unauthorized".bright_red().bold(),
        Outcome::Detected => "detected".bright_red().bold(),
    }
}

fn kind_label(kind: EventKind) -> &'static str {
    match kind {
        EventKind::BadgeAccess => "RFID",
        EventKind::DenialOfService => "DoS",
    }
}

fn system_status_label(status: SystemStatus) -> ColoredString {
    match status {
        SystemStatus::Operational => "OPERATIONAL".bright_green().bold(),
        SystemStatus::Warning => "WARNING".bright_yellow().bold(),
        SystemStatus::Critical => "CRITICAL".bright_red().bold(),
    }
}

fn percent(value: f64, warn_below: f64) -> ColoredString {
    let text = format!("{:.1}%", value);
    if value < warn_below {
        text.bright_yellow().bold()
    } else {
        text.bright_green().bold()
    }
}

pub fn print_status(status: &Value) {
    println!("\n{}", rule("╔", "╗").bright_cyan());
    println!("{}", title("Sentinel Agent Status").bright_cyan().bold());
    println!("{}", rule("╠", "╣").bright_cyan());
    row("Uptime:", format_uptime(status["uptimeSeconds"].as_i64().unwrap_or(0)).bright_white());
    row("Agent:", status["status"].as_str().unwrap_or("unknown").bright_green().bold());
    row("System status:", status["systemStatus"].as_str().unwrap_or("unknown").to_uppercase().bright_white().bold());
    println!("{}", rule("╠", "╣").bright_cyan());
    let events = &status["events"];
    row(
        "Stored events:",
        format!("{} / {}", events["stored"].as_u64().unwrap_or(0), events["capacity"].as_u64().unwrap_or(0))
            .bright_white(),
    );
    row("  Badge access:", events["badgeAccess"].as_u64().unwrap_or(0).to_string().bright_blue());
    row("  Denial of service:", events["denialOfService"].as_u64().unwrap_or(0).to_string().bright_magenta());
    row("  Threats:", events["threats"].as_u64().unwrap_or(0).to_string().bright_red().bold());
    println!("{}\n", rule("╚", "╝").bright_cyan());
}

pub fn print_stats(stats: &SecurityStats) {
    println!("\n{}", rule("╔", "╗").bright_cyan());
    println!("{}", title("Security Statistics").bright_cyan().bold());
    println!("{}", rule("╠", "╣").bright_cyan());
    row("System status:", system_status_label(stats.system_status));
    row("Total scans:", stats.total_scans.to_string().bright_white().bold());
    row("Authorized:", stats.authorized_access.to_string().bright_green());
    row("Unauthorized:", stats.unauthorized_attempts.to_string().bright_red());
    row("DoS attacks:", stats.dos_attacks.to_string().bright_magenta());
    row("Active threats:", stats.active_threats.to_string().bright_yellow().bold());
    println!("{}\n", rule("╚", "╝").bright_cyan());
}

pub fn print_health(health: &SystemHealth) {
    let readers = &health.rfid_readers;
    let reader_status = match readers.status {
        ReaderStatus::Online => "online".bright_green(),
        ReaderStatus::Degraded => "degraded".bright_yellow(),
        ReaderStatus::Offline => "offline".bright_red(),
    };
    let protection_status = match health.dos_protection.status {
        ProtectionStatus::Active => "active".bright_green(),
        ProtectionStatus::Maintenance => "maintenance".bright_yellow(),
        ProtectionStatus::Inactive => "inactive".bright_red(),
    };
    let database_status = match health.database.status {
        StorageStatus::Operational => "operational".bright_green(),
        StorageStatus::Degraded => "degraded".bright_yellow(),
        StorageStatus::Down => "down".bright_red(),
    };
    let network_status = match health.network.status {
        NetworkLoad::Normal => "normal".bright_green(),
        NetworkLoad::Moderate => "moderate".bright_yellow(),
        NetworkLoad::High => "high".bright_red(),
        NetworkLoad::Critical => "critical".bright_red().bold(),
    };

    println!("\n{}", rule("╔", "╗").bright_cyan());
    println!("{}", title("System Health").bright_cyan().bold());
    println!("{}", rule("╠", "╣").bright_cyan());
    row("RFID readers:", reader_status);
    row(
        "",
        format!("{} / {} online ({:.1}%)", readers.online, readers.total, readers.percentage).bright_white(),
    );
    row("DoS protection:", protection_status);
    row("", percent(health.dos_protection.percentage, 97.0));
    row("Database:", database_status);
    row("", percent(health.database.percentage, 95.0));
    row("Network load:", network_status);
    row("", format!("{:.1}%", health.network.percentage).bright_white());
    println!("{}\n", rule("╚", "╝").bright_cyan());
}

pub fn print_events(page: &EventPage) {
    if page.events.is_empty() {
        println!(
            "\n{}\n",
            format!("No events on page {} ({} stored).", page.page, page.total).dimmed()
        );
        return;
    }

    println!(
        "\n{}",
        "┌──────────────────────┬─────────────────────┬──────┬──────────────┬──────────┬──────────────────────┐"
            .bright_cyan()
    );
    println!(
        "{}",
        "│ Event ID             │ Time                │ Kind │ Outcome      │ Severity │ Where                │"
            .bright_cyan()
            .bold()
    );
    println!(
        "{}",
        "├──────────────────────┼─────────────────────┼──────┼──────────────┼──────────┼──────────────────────┤"
            .bright_cyan()
    );

    for event in &page.events {
        let place = event
            .location
            .as_deref()
            .or(event.source_address.as_deref())
            .unwrap_or("-");
        println!(
            "│ {} │ {} │ {:4} │ {} │ {} │ {} │",
            truncate(&event.id, 20).bright_white(),
            event.occurred_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            kind_label(event.kind),
            pad_colored(outcome_label(event.outcome), 12),
            pad_colored(event.severity.as_str().color(severity_color(event.severity)).bold(), 8),
            truncate(place, 20),
        );
    }

    println!(
        "{}",
        "└──────────────────────┴─────────────────────┴──────┴──────────────┴──────────┴──────────────────────┘"
            .bright_cyan()
    );
    let pages = page.total.div_ceil(page.limit.max(1)).max(1);
    println!(
        "{}\n",
        format!("Page {} of {} · {} events stored", page.page, pages, page.total).dimmed()
    );
}

pub fn print_event(event: &SecurityEvent) {
    println!("\n{}", rule("╔", "╗").bright_cyan());
    println!("{}", title("Event Details").bright_cyan().bold());
    println!("{}", rule("╠", "╣").bright_cyan());
    row("ID:", event.id.bright_white().bold());
    row("Time:", event.occurred_at.to_rfc3339().bright_white());
    row("Kind:", event.kind.as_str().bright_white());
    row("Outcome:", outcome_label(event.outcome));
    row("Severity:", event.severity.as_str().color(severity_color(event.severity)).bold());
    if let Some(location) = &event.location {
        row("Location:", location.bright_white());
    }
    if let Some(card) = &event.card_id {
        row("Card:", card.bright_white());
    }
    if let Some(source) = &event.source_address {
        row("Source:", source.bright_white());
    }
    row("Description:", truncate(&event.description, WIDTH - 23).trim_end().normal());
    println!("{}\n", rule("╚", "╝").bright_cyan());
}

fn pad_colored(value: ColoredString, width: usize) -> String {
    let pad = width.saturating_sub(value.chars().count());
    format!("{}{}", value, " ".repeat(pad))
}

pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(2)).collect();
        format!("{}..", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formats() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 5s");
        assert_eq!(format_uptime(3725), "1h 2m 5s");
        assert_eq!(format_uptime(-3), "0s");
    }

    #[test]
    fn truncate_pads_and_cuts() {
        assert_eq!(truncate("abc", 5), "abc  ");
        assert_eq!(truncate("abcdefgh", 5), "abc..");
        assert_eq!(truncate("Lobby", 5), "Lobby");
    }
}
