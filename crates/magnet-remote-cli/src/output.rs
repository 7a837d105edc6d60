//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use magnet_remote_app::{SubmissionOutcome, SubmissionReport};
use magnet_remote_backends::ErrorCategory;
use magnet_remote_config::{ProtocolKind, Settings};
use magnet_remote_history::MagnetRecord;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Which operation produced a report; only affects the table wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReportKind {
    Submission,
    Verification,
}

#[derive(Debug, Serialize)]
struct ReportView {
    id: Uuid,
    state: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    protocol: Option<ProtocolKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<ErrorCategory>,
    message: String,
    transitions: Vec<String>,
}

impl ReportView {
    fn new(report: &SubmissionReport) -> Self {
        let (protocol, category) = match &report.outcome {
            SubmissionOutcome::Succeeded { protocol } => (Some(*protocol), None),
            SubmissionOutcome::Failed { category, .. } => (None, Some(*category)),
            SubmissionOutcome::NotConfigured | SubmissionOutcome::Cancelled => (None, None),
        };
        Self {
            id: report.id,
            state: report.state().to_string(),
            success: report.outcome.is_success(),
            protocol,
            category,
            message: report.outcome.summary(),
            transitions: report
                .transitions
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

pub(crate) fn render_report(
    report: &SubmissionReport,
    kind: ReportKind,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&ReportView::new(report))?,
        OutputFormat::Table => {
            if let Some(line) = report_line(report, kind) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Success line printed to stdout; failures are reported on stderr instead.
pub(crate) fn report_line(report: &SubmissionReport, kind: ReportKind) -> Option<String> {
    let SubmissionOutcome::Succeeded { protocol } = report.outcome else {
        return None;
    };
    Some(match kind {
        ReportKind::Submission => report.outcome.summary(),
        ReportKind::Verification => {
            format!("Connection to {} verified.", protocol.display_name())
        }
    })
}

pub(crate) fn render_settings(settings: &Settings, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(settings)?,
        OutputFormat::Table => {
            for line in settings_lines(settings) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub(crate) fn settings_lines(settings: &Settings) -> Vec<String> {
    let profile = &settings.profile;
    let endpoint = profile
        .base_url()
        .map_or_else(|_| "not configured".to_string(), |url| url.to_string());
    let username = if profile.username.is_empty() {
        "<none>"
    } else {
        profile.username.as_str()
    };

    vec![
        format!(
            "protocol: {} ({})",
            profile.protocol.display_name(),
            profile.protocol.as_str()
        ),
        format!("endpoint: {endpoint}"),
        format!("username: {username}"),
        format!("verified: {}", yes_no(settings.profile_verified)),
        format!("setup completed: {}", yes_no(settings.setup_completed)),
        format!("notifications: {}", on_off(settings.show_notifications)),
    ]
}

pub(crate) fn render_history(records: &[MagnetRecord], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&records)?,
        OutputFormat::Table => {
            for line in history_lines(records) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

pub(crate) fn history_lines(records: &[MagnetRecord]) -> Vec<String> {
    if records.is_empty() {
        return vec!["No recent magnets.".to_string()];
    }
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(format!("{:<16} NAME", "ADDED"));
    lines.extend(records.iter().map(|record| {
        format!(
            "{:<16} {}",
            record.added_at.format(TIMESTAMP_FORMAT).to_string(),
            record.display_name
        )
    }));
    lines
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

const fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

const fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
