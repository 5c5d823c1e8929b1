use super::{kinds_or_all, print_json};
use crate::install::Installer;
use crate::types::package::PackageKind;
use crate::utils::logger::Logger;
use anyhow::Context;

pub async fn list(
    installer: &Installer,
    kind: Option<PackageKind>,
    json: bool,
) -> anyhow::Result<()> {
    let mut installed = Vec::new();
    for kind in kinds_or_all(kind) {
        installed.extend(installer.list_installed(kind).await?);
    }

    if json {
        return print_json(&installed);
    }
    if installed.is_empty() {
        Logger::new().info("Nothing installed yet");
        return Ok(());
    }
    for package in installed {
        println!("- {:<10} {}", package.kind.as_str(), package.slug);
    }
    Ok(())
}

pub async fn uninstall(
    installer: &Installer,
    kind: PackageKind,
    slug: &str,
    yes: bool,
) -> anyhow::Result<()> {
    let logger = Logger::new();

    if !installer.is_installed(kind, slug).await? {
        logger.info(&format!("{} '{}' is not installed", kind, slug));
        return Ok(());
    }

    if !yes {
        let confirmed = inquire::Confirm::new(&format!("Remove {} '{}'?", kind, slug))
            .with_default(false)
            .prompt()
            .context("Failed to prompt for confirmation")?;
        if !confirmed {
            logger.info("Uninstall cancelled");
            return Ok(());
        }
    }

    installer
        .uninstall(kind, slug)
        .await
        .with_context(|| format!("Failed to uninstall {} '{}'", kind, slug))?;
    logger.success(&format!("Removed {} '{}'", kind, slug));
    Ok(())
}
