//! `wslstack resolve`: run the release resolver on its own.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::resolver::resolve_artifact;
use crate::commands::selected_releases;
use crate::infra::http::UreqHttp;

/// Arguments for the resolve command.
#[derive(Args, Default)]
pub struct ResolveArgs {
    /// Only consider this release (version or codename); repeatable
    #[arg(long = "release", value_name = "VERSION")]
    pub releases: Vec<String>,
}

/// Run `wslstack resolve`.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, a filter names an unknown
/// release, or no candidate has a reachable root filesystem.
pub async fn run(args: &ResolveArgs, app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    let candidates = selected_releases(&config, &args.releases)?;
    let http = UreqHttp::new(true);
    let artifact = resolve_artifact(
        &candidates,
        &config.locator(),
        &http,
        &http,
        &app.terminal_reporter(),
    )
    .await?;
    app.renderer().render_artifact(&artifact)
}
