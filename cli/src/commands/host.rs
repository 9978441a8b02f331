//! `wslstack host`: launch the container on this Linux host.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::provision::provision_host;
use crate::infra::host::HostShell;

/// Run `wslstack host`.
///
/// # Errors
///
/// Returns an error if Docker is not reachable or a `docker` call fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    let shell = HostShell::new(&app.runner);
    let outcome = provision_host(
        &shell,
        &config.container,
        config.host.sudo,
        &app.terminal_reporter(),
    )
    .await?;
    app.renderer().render_host(&config.container.name, &outcome)
}
