use crate::core::currency::{CurrencySet, format_amount};
use crate::core::history::ConversionRecord;
use crate::core::session::{RateStatus, Session};
use chrono::{DateTime, Local, Utc};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Result,
    Online,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Result => style(text).green().bold(),
        StyleType::Online => style(text).green(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn right_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Creates a spinner shown while the rate feed is contacted.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Coarse "how long ago" for the last update line.
pub fn format_age(age: chrono::Duration) -> String {
    match age.num_minutes() {
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{m} min ago"),
        m if m < 60 * 24 => format!("{} h ago", m / 60),
        m => format!("{} days ago", m / (60 * 24)),
    }
}

/// `symbol amount CODE`, with the two-decimal display convention.
pub fn money(currencies: &CurrencySet, code: &str, value: f64) -> String {
    let symbol = currencies.symbol(code);
    if symbol.is_empty() {
        format!("{} {code}", format_amount(value))
    } else {
        format!("{symbol} {} {code}", format_amount(value))
    }
}

pub fn conversion_line(currencies: &CurrencySet, record: &ConversionRecord) -> String {
    format!(
        "{} → {}",
        money(currencies, &record.from, record.amount),
        money(currencies, &record.to, record.result)
    )
}

/// Connection indicator, last update time and any error message.
pub fn status_lines(session: &Session) -> Vec<String> {
    let mut lines = Vec::new();

    let indicator = match session.status() {
        RateStatus::Live => style_text("● online", StyleType::Online),
        RateStatus::Saved => style_text("● saved rates", StyleType::Subtle),
        RateStatus::Stale | RateStatus::NoRatesAvailable => {
            style_text("● offline", StyleType::Error)
        }
        RateStatus::Unknown => style_text("● not loaded", StyleType::Subtle),
    };
    lines.push(indicator);

    if let Some(snapshot) = session.snapshot() {
        lines.push(style_text(
            &format!(
                "Last update: {} ({})",
                format_timestamp(snapshot.captured_at),
                format_age(snapshot.age(Utc::now()))
            ),
            StyleType::Subtle,
        ));
    }

    if let Some(message) = session.last_error() {
        lines.push(style_text(message, StyleType::Error));
    }
    lines
}

pub fn print_status(session: &Session) {
    for line in status_lines(session) {
        println!("{line}");
    }
}

/// Table of the current rates for every supported currency.
pub fn rates_table(session: &Session) -> Option<Table> {
    let snapshot = session.snapshot()?;
    let currencies = session.currencies();

    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("Currency"),
        header_cell("Name"),
        header_cell(&format!("Rate (base {})", currencies.base())),
    ]);
    for currency in currencies.iter() {
        let rate = snapshot
            .table
            .rate(&currency.code)
            .map_or_else(|| "N/A".to_string(), |r| format!("{r:.6}"));
        table.add_row(vec![
            Cell::new(&currency.code).add_attribute(Attribute::Bold),
            Cell::new(&currency.name),
            right_cell(rate),
        ]);
    }
    Some(table)
}

/// Table of past conversions, newest first.
pub fn history_table(currencies: &CurrencySet, records: &[ConversionRecord]) -> Table {
    let mut table = new_styled_table();
    table.set_header(vec![
        header_cell("When"),
        header_cell("From"),
        header_cell("To"),
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(format_timestamp(record.timestamp)).fg(Color::DarkGrey),
            right_cell(money(currencies, &record.from, record.amount)),
            right_cell(money(currencies, &record.to, record.result)).fg(Color::Green),
        ]);
    }
    table
}
