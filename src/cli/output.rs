//! Output formatting helpers for CLI commands

use crate::llm::{ConnectionTest, GenerationResult};
use crate::services::{ConnectionState, ServiceDescriptor, StatusMap};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

fn colored_state(state: ConnectionState) -> String {
    match state {
        ConnectionState::Connected => "connected".green().to_string(),
        ConnectionState::Disconnected => "disconnected".yellow().to_string(),
        ConnectionState::Error => "error".red().to_string(),
    }
}

/// Format service status as a table, one row per configured service
pub fn format_status_table(status: &StatusMap, descriptors: &[ServiceDescriptor]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Service", "Endpoint", "Transport", "State"]);

    for d in descriptors {
        let state = status.get(&d.id).copied().unwrap_or_default();
        table.add_row(vec![
            Cell::new(d.id),
            Cell::new(&d.endpoint),
            Cell::new(format!("{:?}", d.transport).to_lowercase()),
            Cell::new(colored_state(state)),
        ]);
    }

    let connected = status
        .values()
        .filter(|s| **s == ConnectionState::Connected)
        .count();
    format!(
        "{}\n{} of {} services connected",
        table,
        connected,
        status.len()
    )
}

pub fn format_status_json(status: &StatusMap) -> String {
    serde_json::to_string_pretty(&json!({ "services": status })).unwrap_or_default()
}

pub fn format_generation(result: &GenerationResult, as_json: bool) -> String {
    if as_json {
        return serde_json::to_string_pretty(result).unwrap_or_default();
    }
    let model = result.model.as_deref().unwrap_or("unknown model");
    format!(
        "{}\n\n{}",
        result.content.trim(),
        format!("via {} ({})", result.provider, model).dimmed()
    )
}

pub fn format_ideas(ideas: &[String], as_json: bool) -> String {
    if as_json {
        return serde_json::to_string_pretty(&json!({ "ideas": ideas })).unwrap_or_default();
    }
    ideas
        .iter()
        .enumerate()
        .map(|(i, idea)| format!("{}. {}", i + 1, idea))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_connection_test(provider: &str, test: &ConnectionTest, as_json: bool) -> String {
    if as_json {
        return serde_json::to_string_pretty(test).unwrap_or_default();
    }
    match (test.success, &test.error) {
        (true, _) => format!(
            "{} {} responded in {}ms",
            "✓".green(),
            provider,
            test.response_time_ms
        ),
        (false, error) => format!(
            "{} {} failed after {}ms: {}",
            "✗".red(),
            provider,
            test.response_time_ms,
            error.as_deref().unwrap_or("unknown error")
        ),
    }
}
