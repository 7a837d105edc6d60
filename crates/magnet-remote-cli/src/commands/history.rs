//! Recent-magnet history commands.

use tracing::info;

use crate::client::{CliContext, CliError, CliResult};
use crate::output::render_history;

pub(crate) fn handle_history_list(ctx: &CliContext) -> CliResult<()> {
    render_history(&ctx.app.history.records(), ctx.output)
}

pub(crate) fn handle_history_clear(ctx: &CliContext) -> CliResult<()> {
    let removed = ctx.app.history.len();
    ctx.app.clear_history().map_err(CliError::failure)?;
    info!(removed, "history cleared");
    println!("History cleared.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use magnet_remote_history::{HISTORY_KEY, JsonFileStore, KeyValueStore};

    #[test]
    fn clear_empties_the_persisted_list() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = CliContext::open(dir.path(), OutputFormat::Table)?;
        ctx.app
            .history
            .add("magnet:?xt=urn:btih:0123456789abcdef&dn=Kept")?;
        handle_history_list(&ctx)?;

        handle_history_clear(&ctx)?;

        assert!(ctx.app.history.is_empty());
        let stored = JsonFileStore::in_dir(dir.path()).get(HISTORY_KEY)?;
        assert_eq!(stored.as_deref(), Some(b"[]".as_slice()));
        Ok(())
    }
}
