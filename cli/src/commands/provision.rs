//! `wslstack provision`: the full WSL flow.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::{DistroManager, LocalPaths};
use crate::application::services::distro::is_registered;
use crate::application::services::provision::{
    ProvisionOptions, ProvisionPorts, provision_wsl,
};
use crate::commands::selected_releases;
use crate::domain::config::validate_distro_name;
use crate::domain::error::ProvisionError;
use crate::infra::archive::LocalArchiveExpander;
use crate::infra::fs::LocalFs;
use crate::infra::http::UreqHttp;
use crate::infra::wsl::{WslCli, WslShell};

/// Arguments for the provision command.
#[derive(Args, Default)]
pub struct ProvisionArgs {
    /// Only consider this release (version or codename); repeatable
    #[arg(long = "release", value_name = "VERSION")]
    pub releases: Vec<String>,

    /// Distribution name (defaults to distro.name from the config)
    #[arg(long)]
    pub name: Option<String>,

    /// Unregister and re-import an existing distribution of the same name
    #[arg(long)]
    pub force: bool,

    /// Do not ask before replacing an existing distribution
    #[arg(short, long)]
    pub yes: bool,

    /// Stop after installing the container runtime
    #[arg(long)]
    pub skip_container: bool,
}

/// Run `wslstack provision`.
///
/// # Errors
///
/// Returns an error if `wsl.exe` is unavailable, no release resolves, or any
/// provisioning step fails.
pub async fn run(args: &ProvisionArgs, app: &AppContext) -> Result<()> {
    let config = app.load_config()?;
    let name = args.name.clone().unwrap_or_else(|| config.distro.name.clone());
    validate_distro_name(&name)?;
    let candidates = selected_releases(&config, &args.releases)?;

    let distros = WslCli::new(&app.runner);
    let existing = distros.list().await.map_err(|e| {
        tracing::debug!(error = %e, "wsl.exe preflight failed");
        if is_not_found(&e) {
            ProvisionError::WslUnavailable.into()
        } else {
            e.context("WSL is installed but cannot list distributions")
        }
    })?;
    let present = is_registered(&existing, &name);
    let replace = args.force
        && present
        && app.confirm(
            &format!("Unregister '{name}' and delete its disk before re-importing?"),
            true,
        )?;
    if args.force && present && !replace {
        app.output.info(&format!("Keeping existing distribution '{name}'."));
    }

    let fs = LocalFs::new(config.paths.cache_dir.clone(), config.distro.install_dir.clone());
    let cache_dir = fs.cache_dir()?;
    let install_dir = fs.install_dir(&name)?;
    let http = UreqHttp::new(!app.output.show_progress());
    let shell = WslShell::new(&app.runner, name.as_str());
    let locator = config.locator();

    let ports = ProvisionPorts {
        probe: &http,
        index: &http,
        downloader: &http,
        expander: &LocalArchiveExpander,
        hasher: &fs,
        fs: &fs,
        distros: &distros,
        shell: &shell,
        state: &app.state_mgr,
    };
    let opts = ProvisionOptions {
        candidates: &candidates,
        locator: &locator,
        cache_dir: &cache_dir,
        distro: &name,
        install_dir: &install_dir,
        wsl_version: config.distro.wsl_version,
        registered: &existing,
        replace,
        container: (!args.skip_container).then_some(&config.container),
    };

    let outcome = provision_wsl(&ports, &opts, &app.terminal_reporter()).await?;
    app.renderer().render_provision(&name, &outcome)
}

/// `true` when the error chain bottoms out in a missing executable.
fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
    })
}
