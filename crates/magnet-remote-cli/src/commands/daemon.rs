//! Commands that talk to the configured daemon.

use std::sync::Arc;

use anyhow::anyhow;
use magnet_remote_app::{AppError, SubmissionOutcome, SubmissionReport};
use magnet_remote_config::ConfigStore;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::cli::SendArgs;
use crate::client::{CliContext, CliError, CliResult, config_error};
use crate::output::{ReportKind, render_report};

const MAGNET_SCHEME: &str = "magnet:";

pub(crate) async fn handle_send(ctx: &CliContext, args: SendArgs) -> CliResult<()> {
    let magnet = validate_magnet(&args.magnet)?.to_string();
    prepare_credentials(ctx).await?;

    let orchestrator = Arc::new(ctx.app.orchestrator());
    let (mut handle, cancel) = orchestrator.spawn_submit(magnet);
    let joined = tokio::select! {
        joined = &mut handle => joined,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("interrupt received; cancelling submission");
            cancel.cancel();
            handle.await
        }
    };

    let report = joined
        .map_err(|source| {
            CliError::failure(AppError::Task {
                operation: "submission.join",
                source,
            })
        })?
        .map_err(CliError::failure)?;
    conclude(&report, ReportKind::Submission, ctx)
}

pub(crate) async fn handle_test(ctx: &CliContext) -> CliResult<()> {
    prepare_credentials(ctx).await?;

    let orchestrator = ctx.app.orchestrator();
    let cancel = CancellationToken::new();
    let verify = orchestrator.verify(&cancel);
    tokio::pin!(verify);
    let result = tokio::select! {
        result = &mut verify => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("interrupt received; cancelling connection test");
            cancel.cancel();
            verify.await
        }
    };

    let report = result.map_err(CliError::failure)?;
    conclude(&report, ReportKind::Verification, ctx)
}

/// Trimmed magnet URI, or a validation error when the scheme is missing.
pub(crate) fn validate_magnet(raw: &str) -> CliResult<&str> {
    let trimmed = raw.trim();
    let has_scheme = trimmed
        .get(..MAGNET_SCHEME.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(MAGNET_SCHEME));
    if has_scheme {
        Ok(trimmed)
    } else {
        Err(CliError::validation("argument is not a magnet link (expected magnet:?...)"))
    }
}

async fn prepare_credentials(ctx: &CliContext) -> CliResult<()> {
    let settings = ctx.app.config.load().await.map_err(config_error)?;
    if settings.profile.is_configured() {
        ctx.load_password(&settings.profile).await?;
    }
    Ok(())
}

fn conclude(report: &SubmissionReport, kind: ReportKind, ctx: &CliContext) -> CliResult<()> {
    render_report(report, kind, ctx.output)?;
    match &report.outcome {
        SubmissionOutcome::Succeeded { .. } => Ok(()),
        SubmissionOutcome::NotConfigured => Err(CliError::validation(
            "no server configured; run `magnet-remote config set` first",
        )),
        SubmissionOutcome::Failed { message, .. } => Err(CliError::failure(anyhow!("{message}"))),
        SubmissionOutcome::Cancelled => Err(CliError::failure(anyhow!("operation cancelled"))),
    }
}
