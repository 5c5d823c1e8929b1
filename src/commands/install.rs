use crate::install::{InstallReporter, InstallStage, Installer, NoopReporter};
use crate::types::package::PackageKind;
use crate::types::progress::DownloadProgress;
use crate::utils::logger::{LogLevel, Logger};
use crate::utils::spinner::{DownloadBar, DownloadBars, run_step};
use anyhow::{Context, anyhow};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Drives one progress bar per install.
struct BarReporter {
    bar: DownloadBar,
}

impl InstallReporter for BarReporter {
    fn stage(&self, _slug: &str, stage: InstallStage) {
        self.bar.set_message(stage.to_string());
    }

    fn progress(&self, _slug: &str, progress: &DownloadProgress) {
        self.bar.update(progress);
    }
}

/// Installs every slug concurrently and reports each result. Fails if any
/// install failed.
pub async fn install(
    installer: Arc<Installer>,
    kind: PackageKind,
    slugs: Vec<String>,
) -> anyhow::Result<()> {
    let logger = Logger::new();
    let bars = DownloadBars::new();
    let mut tasks = JoinSet::new();

    for slug in slugs.iter().cloned() {
        let installer = Arc::clone(&installer);
        let reporter = BarReporter {
            bar: bars.add(&slug),
        };
        tasks.spawn(async move {
            let result = installer.install(kind, &slug, &reporter).await;
            reporter.bar.finish();
            result
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(outcome)) => logger.success(&format!(
                "Installed {} '{}' v{} ({} bytes) into {}",
                kind,
                outcome.package.slug,
                outcome.version,
                outcome.bytes,
                outcome.package.path.display()
            )),
            Ok(Err(failure)) => {
                failed += 1;
                let detail = format!("while {}: {}", failure.stage, failure.error);
                logger.log_message_with_trace(
                    LogLevel::Error,
                    &format!("Failed to install {} '{}'", kind, failure.slug),
                    vec![detail.as_str()],
                );
            }
            Err(e) => {
                failed += 1;
                logger.error(&format!("Install task aborted: {}", e));
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!("{} of {} installs failed", failed, slugs.len()));
    }
    Ok(())
}

pub async fn download(
    installer: &Installer,
    kind: PackageKind,
    slug: &str,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let path = run_step(
        &format!("Downloading {} '{}'...", kind, slug),
        |path: &std::path::PathBuf| format!("Saved {}", path.display()),
        installer.download_only(kind, slug, out_dir, &NoopReporter),
    )
    .await
    .with_context(|| format!("Failed to download {} '{}'", kind, slug))?;

    println!("{}", path.display());
    Ok(())
}
