use std::net::IpAddr;

use colored::*;
use nfusion_common::model::{PortState, Severity};

use crate::terminal::colors;

pub fn ip(ip: &IpAddr) -> ColoredString {
    match ip {
        IpAddr::V4(v4) => v4.to_string().color(colors::IPV4_ADDR),
        IpAddr::V6(v6) => v6.to_string().color(colors::IPV6_ADDR),
    }
}

pub fn state(state: PortState) -> ColoredString {
    let color = match state {
        PortState::Open => colors::STATE_OPEN,
        PortState::Filtered => colors::STATE_FILTERED,
        PortState::Closed => colors::STATE_CLOSED,
    };
    state.as_str().color(color)
}

pub fn severity(severity: Severity) -> ColoredString {
    let text = severity.to_string();
    match severity {
        Severity::Critical => text.color(colors::SEVERITY_CRITICAL).bold(),
        Severity::High => text.color(colors::SEVERITY_HIGH).bold(),
        Severity::Medium => text.color(colors::SEVERITY_MEDIUM),
        Severity::Low => text.color(colors::SEVERITY_LOW),
        Severity::Info => text.color(colors::SEVERITY_INFO),
    }
}

pub fn optional_severity(severity_opt: Option<Severity>) -> ColoredString {
    match severity_opt {
        Some(s) => severity(s),
        None => "none".color(colors::SEPARATOR),
    }
}

/// Comma-joined list, or a dimmed dash when empty.
pub fn list<T: AsRef<str>>(items: &[T]) -> ColoredString {
    if items.is_empty() {
        return "-".color(colors::SEPARATOR);
    }
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(", ")
        .color(colors::TEXT_DEFAULT)
}

/// Cuts `text` to `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
