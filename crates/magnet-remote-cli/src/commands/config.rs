//! Daemon profile commands.

use magnet_remote_config::{ConfigStore, ProtocolKind, ServerProfile, validate_profile};
use tracing::info;

use crate::cli::ConfigSetArgs;
use crate::client::{CliContext, CliError, CliResult, config_error};
use crate::output::render_settings;

pub(crate) async fn handle_config_show(ctx: &CliContext) -> CliResult<()> {
    let settings = ctx.app.config.load().await.map_err(config_error)?;
    render_settings(&settings, ctx.output)
}

pub(crate) async fn handle_config_set(ctx: &CliContext, args: ConfigSetArgs) -> CliResult<()> {
    let notifications = args.notifications;
    let profile = profile_from_args(args)?;
    let protocol = profile.protocol;
    let config = &ctx.app.config;

    config.replace_profile(profile).await.map_err(config_error)?;
    let mut settings = config.load().await.map_err(config_error)?;
    if let Some(switch) = notifications {
        settings.show_notifications = switch.enabled();
        config.save(&settings).await.map_err(config_error)?;
    }

    info!(protocol = protocol.as_str(), "daemon profile updated");
    render_settings(&settings, ctx.output)
}

fn profile_from_args(args: ConfigSetArgs) -> CliResult<ServerProfile> {
    let profile = ServerProfile {
        protocol: args.protocol,
        host: args.host.trim().to_string(),
        port: args.port.unwrap_or_else(|| args.protocol.default_port()),
        use_tls: args.tls,
        username: args.username.unwrap_or_default(),
    };
    validate_profile(&profile).map_err(config_error)?;

    if profile.protocol == ProtocolKind::Synology && !profile.use_tls {
        return Err(CliError::validation(
            "Synology Download Station requires HTTPS; pass --tls",
        ));
    }
    Ok(profile)
}
