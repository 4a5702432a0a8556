//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one record per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use dashsync_core::{
    DeviceConfig, DeviceOutcome, OutcomeStatus, ReconcileReport, WanConfig, WanEnabled,
};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn paint_status(status: &OutcomeStatus, color: bool) -> String {
    let label = status.label();
    if !color {
        return label.to_owned();
    }
    match status {
        OutcomeStatus::Updated { .. } => label.green().to_string(),
        OutcomeStatus::Unchanged => label.dimmed().to_string(),
        OutcomeStatus::DryRun { .. } => label.yellow().to_string(),
        OutcomeStatus::Failed { .. } => label.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table and plain views use pre-formatted strings.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    plain_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Yaml => render_yaml(data),
        OutputFormat::Plain => plain_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.expect("serialization should not fail")
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}

// ── Normalized fragments ─────────────────────────────────────────────

#[derive(Tabled)]
struct FragmentRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Lat/Lng")]
    coordinates: String,
    #[tabled(rename = "WAN1")]
    wan1: String,
    #[tabled(rename = "WAN2")]
    wan2: String,
}

impl From<&DeviceConfig> for FragmentRow {
    fn from(config: &DeviceConfig) -> Self {
        let identity = config.identity.as_ref();
        let wan = config.wan.as_ref();
        let coordinates = match identity.map(|i| (i.lat, i.lng)) {
            Some((Some(lat), Some(lng))) => format!("{lat}, {lng}"),
            Some((Some(lat), None)) => format!("{lat}, -"),
            Some((None, Some(lng))) => format!("-, {lng}"),
            _ => String::new(),
        };
        Self {
            serial: config.serial.to_string(),
            name: identity.and_then(|i| i.name.clone()).unwrap_or_default(),
            tags: identity
                .and_then(|i| i.tags.as_ref())
                .map(|t| t.join(" "))
                .unwrap_or_default(),
            address: identity.and_then(|i| i.address.clone()).unwrap_or_default(),
            coordinates,
            wan1: wan.and_then(|w| w.wan1.as_ref()).map(summarize_wan).unwrap_or_default(),
            wan2: wan.and_then(|w| w.wan2.as_ref()).map(summarize_wan).unwrap_or_default(),
        }
    }
}

fn summarize_wan(wan: &WanConfig) -> String {
    let mut parts = Vec::new();
    if wan.wan_enabled != WanEnabled::NotConfigured {
        parts.push(wan.wan_enabled.to_string());
    }
    if wan.using_static_ip {
        parts.push(wan.static_ip.clone().unwrap_or_else(|| "static".into()));
    }
    if let Some(vlan) = wan.vlan {
        parts.push(format!("vlan {vlan}"));
    }
    if let Some(ref dns) = wan.static_dns {
        parts.push(format!("dns {}", dns.join(" ")));
    }
    parts.join(", ")
}

pub fn render_fragments(format: OutputFormat, configs: &[DeviceConfig]) -> String {
    render_list(format, configs, |c| FragmentRow::from(c), |c| c.serial.to_string())
}

// ── Reconcile report ─────────────────────────────────────────────────

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn outcome_row(outcome: &DeviceOutcome, color: bool) -> OutcomeRow {
    OutcomeRow {
        serial: outcome.serial.to_string(),
        endpoint: outcome.endpoint.to_string(),
        status: paint_status(&outcome.status, color),
        detail: outcome.status.detail(),
    }
}

fn summary_line(report: &ReconcileReport) -> String {
    format!(
        "{} updated, {} unchanged, {} dry-run, {} failed",
        report.updated(),
        report.unchanged(),
        report.dry_run(),
        report.failed()
    )
}

pub fn render_report(format: OutputFormat, report: &ReconcileReport, color: bool) -> String {
    render_single(
        format,
        report,
        |r| {
            if r.outcomes.is_empty() {
                return "Nothing to reconcile.".into();
            }
            let rows: Vec<OutcomeRow> = r.outcomes.iter().map(|o| outcome_row(o, color)).collect();
            format!("{}\n{}", render_table(&rows), summary_line(r))
        },
        |r| {
            r.outcomes
                .iter()
                .map(|o| format!("{}\t{}\t{}", o.serial, o.endpoint, o.status.label()))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )
}
