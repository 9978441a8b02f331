//! `wslstack status`: distribution, container and last provisioning run.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::status::gather_status;
use crate::infra::wsl::{WslCli, WslShell};

/// Run `wslstack status`.
///
/// # Errors
///
/// Returns an error if the config or state file cannot be read.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    let distro = &config.distro.name;
    let report = gather_status(
        &WslCli::new(&app.runner),
        &WslShell::new(&app.runner, distro.as_str()),
        &app.state_mgr,
        distro,
        &config.container.name,
    )
    .await?;
    app.renderer().render_status(&report)
}
