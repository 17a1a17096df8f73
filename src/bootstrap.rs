//! Package-manager precondition checked before any module runs.
use anyhow::Result;

use crate::dry_run::DryRun;
use crate::error::PreconditionError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::{Os, Platform};
use crate::resources::package::PackageManager;

/// Re-registers the App Installer package, which ships `winget`.
const APP_INSTALLER_SCRIPT: &str = "Add-AppxPackage -RegisterByFamilyName -MainPackage \
                                    Microsoft.DesktopAppInstaller_8wekyb3d8bbwe";

/// Make sure a supported package manager is available.
///
/// Returns the platform with its package manager filled in. On Windows a
/// missing `winget` is installed once; Linux distributions ship their
/// manager, so nothing is attempted there. In a dry run a missing manager
/// is only reported.
///
/// # Errors
///
/// Returns [`PreconditionError::BootstrapUnavailable`] when no manager is
/// present after the install attempt.
pub fn ensure_package_manager(
    platform: Platform,
    executor: &dyn Executor,
    dry_run: DryRun,
    log: &dyn Log,
) -> Result<Platform, PreconditionError> {
    if let Some(manager) = platform.package_manager {
        log.debug(&format!("package manager: {manager}"));
        return Ok(platform);
    }

    if dry_run.is_active() {
        log.warn("no supported package manager found");
        if platform.is_windows() {
            log.dry_run("would install winget (App Installer)");
        }
        return Ok(platform);
    }

    match platform.os {
        Os::Windows => {
            log.info("winget not found, installing App Installer");
            if let Err(e) = install_winget(executor) {
                log.warn(&format!("App Installer registration failed: {e:#}"));
            }
            let manager = PackageManager::detect(Os::Windows, executor).ok_or_else(|| {
                PreconditionError::BootstrapUnavailable(
                    "winget is still unavailable after installing App Installer".to_string(),
                )
            })?;
            log.info(&format!("{manager} installed"));
            Ok(Platform::new(Os::Windows, Some(manager)))
        }
        Os::Linux => Err(PreconditionError::BootstrapUnavailable(
            "none of apt-get, dnf or pacman is on PATH".to_string(),
        )),
    }
}

fn install_winget(executor: &dyn Executor) -> Result<()> {
    executor.run("powershell", &["-NoProfile", "-Command", APP_INSTALLER_SCRIPT])?;
    Ok(())
}
