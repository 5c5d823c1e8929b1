use super::download::download_to;
use super::extract::install_archive;
use super::staging::{StagedFile, artifact_file_name, part_path, staging_path};
use super::verify::verify_file;
use crate::catalog::CatalogClient;
use crate::error::{MarketError, MarketResult};
use crate::types::package::{PackageKind, PackageMetadata, Platform};
use crate::types::progress::DownloadProgress;
use crate::utils::config::MarketConfig;
use crate::utils::fs::{
    ensure_dir, list_entry_names, move_file, remove_dir_if_exists, remove_file_if_exists,
};
use crate::utils::logger::Logger;
use crate::utils::semver::within_bounds;
use crate::utils::slug::validate_slug;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallStage {
    FetchingMetadata,
    Downloading,
    Verifying,
    Extracting,
    Installed,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallStage::FetchingMetadata => "fetching metadata",
            InstallStage::Downloading => "downloading",
            InstallStage::Verifying => "verifying",
            InstallStage::Extracting => "extracting",
            InstallStage::Installed => "installed",
        };
        f.write_str(label)
    }
}

/// An install that stopped at `stage`.
#[derive(Debug, Error)]
#[error("{kind} '{slug}' failed while {stage}: {error}")]
pub struct InstallFailure {
    pub kind: PackageKind,
    pub slug: String,
    pub stage: InstallStage,
    #[source]
    pub error: MarketError,
}

/// Observer for install progress. Both hooks default to doing nothing.
pub trait InstallReporter: Send + Sync {
    fn stage(&self, _slug: &str, _stage: InstallStage) {}
    fn progress(&self, _slug: &str, _progress: &DownloadProgress) {}
}

pub struct NoopReporter;

impl InstallReporter for NoopReporter {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    pub kind: PackageKind,
    pub slug: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct InstallOutcome {
    pub package: InstalledPackage,
    pub version: String,
    /// Verified digest; `None` for themes.
    pub checksum: Option<String>,
    pub bytes: u64,
}

pub struct Installer {
    catalog: CatalogClient,
    config: MarketConfig,
}

impl Installer {
    pub fn new(config: MarketConfig) -> MarketResult<Self> {
        let catalog = CatalogClient::new(&config)?;
        Ok(Installer { catalog, config })
    }

    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    fn package_path(&self, kind: PackageKind, slug: &str) -> PathBuf {
        let root = self.config.install_root(kind);
        if kind.is_archive() {
            root.join(slug)
        } else {
            root.join(format!("{}.json", slug))
        }
    }

    /// Fetches, downloads, verifies and unpacks one package.
    ///
    /// Nothing under the install root changes until the final rename, so a
    /// failure at any stage leaves a previously installed copy untouched.
    pub async fn install(
        &self,
        kind: PackageKind,
        slug: &str,
        reporter: &dyn InstallReporter,
    ) -> Result<InstallOutcome, InstallFailure> {
        let fail = |stage: InstallStage| {
            move |error: MarketError| InstallFailure {
                kind,
                slug: slug.to_string(),
                stage,
                error,
            }
        };

        reporter.stage(slug, InstallStage::FetchingMetadata);
        let meta = self
            .catalog
            .get(kind, slug)
            .await
            .map_err(fail(InstallStage::FetchingMetadata))?;
        self.check_compatibility(&meta)
            .map_err(fail(InstallStage::FetchingMetadata))?;

        reporter.stage(slug, InstallStage::Downloading);
        let (staged, bytes) = self
            .stage_artifact(&meta, reporter)
            .await
            .map_err(fail(InstallStage::Downloading))?;

        let checksum = match meta.checksum() {
            Some(expected) => {
                reporter.stage(slug, InstallStage::Verifying);
                let actual = verify_file(staged.path(), expected)
                    .await
                    .map_err(fail(InstallStage::Verifying))?;
                Some(actual)
            }
            None => None,
        };

        self.catalog
            .track_download(meta.id(), kind, meta.version())
            .await;

        reporter.stage(slug, InstallStage::Extracting);
        let path = if kind.is_archive() {
            self.unpack(kind, slug, staged.path()).await
        } else {
            self.place_theme(slug, staged.path()).await
        }
        .map_err(fail(InstallStage::Extracting))?;
        drop(staged);

        reporter.stage(slug, InstallStage::Installed);
        Logger::new().debug(&format!("Installed {} '{}' at {}", kind, slug, path.display()));

        Ok(InstallOutcome {
            package: InstalledPackage {
                kind,
                slug: slug.to_string(),
                path,
            },
            version: meta.version().to_string(),
            checksum,
            bytes,
        })
    }

    /// Fetches and verifies the artifact for `slug` into `dest_dir` without
    /// installing it. Returns the path of the downloaded file.
    pub async fn download_only(
        &self,
        kind: PackageKind,
        slug: &str,
        dest_dir: &Path,
        reporter: &dyn InstallReporter,
    ) -> MarketResult<PathBuf> {
        let meta = self.catalog.get(kind, slug).await?;
        let dest = dest_dir.join(artifact_file_name(kind, meta.slug(), meta.version())?);

        // An existing file at `dest` is only replaced by a verified download.
        let staged = StagedFile::new(part_path(&dest));
        let on_progress = |p: &DownloadProgress| reporter.progress(slug, p);
        download_to(
            self.catalog.http(),
            meta.download_url(),
            staged.path(),
            Some(&on_progress),
        )
        .await?;

        if let Some(expected) = meta.checksum() {
            verify_file(staged.path(), expected).await?;
        }
        tokio::fs::rename(staged.path(), &dest)
            .await
            .map_err(|e| MarketError::fs(&dest, e))?;
        let _ = staged.keep();

        self.catalog
            .track_download(meta.id(), kind, meta.version())
            .await;

        Ok(dest)
    }

    /// Removes an installed package. Returns `false` when it was not
    /// installed; that is not an error.
    pub async fn uninstall(&self, kind: PackageKind, slug: &str) -> MarketResult<bool> {
        let slug = validate_slug(slug)?;
        let path = self.package_path(kind, slug);
        let removed = if kind.is_archive() {
            remove_dir_if_exists(&path).await?
        } else {
            remove_file_if_exists(&path).await?
        };
        if removed {
            Logger::new().debug(&format!("Removed {}", path.display()));
        }
        Ok(removed)
    }

    /// Installed packages of `kind`, sorted by slug.
    pub async fn list_installed(&self, kind: PackageKind) -> MarketResult<Vec<InstalledPackage>> {
        let root = self.config.install_root(kind);
        let names = if kind.is_archive() {
            list_entry_names(&root, |ft, _| ft.is_dir()).await?
        } else {
            list_entry_names(&root, |ft, name| ft.is_file() && name.ends_with(".json"))
                .await?
                .into_iter()
                .filter_map(|n| n.strip_suffix(".json").map(str::to_string))
                .collect()
        };

        Ok(names
            .into_iter()
            .map(|slug| InstalledPackage {
                kind,
                path: self.package_path(kind, &slug),
                slug,
            })
            .collect())
    }

    pub async fn is_installed(&self, kind: PackageKind, slug: &str) -> MarketResult<bool> {
        let slug = validate_slug(slug)?;
        let path = self.package_path(kind, slug);
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(if kind.is_archive() {
                meta.is_dir()
            } else {
                meta.is_file()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MarketError::fs(&path, e)),
        }
    }

    /// Host-version and platform gate for plugins. Skipped when no host
    /// version is configured.
    fn check_compatibility(&self, meta: &PackageMetadata) -> MarketResult<()> {
        let PackageMetadata::Plugin(plugin) = meta else {
            return Ok(());
        };

        if plugin.platform == Platform::Windows && !cfg!(windows) {
            return Err(MarketError::Incompatible(format!(
                "'{}' only runs on Windows",
                plugin.slug
            )));
        }

        if let Some(host) = &self.config.host_version {
            if !within_bounds(host, &plugin.min_version, plugin.max_version.as_deref()) {
                let max = plugin.max_version.as_deref().unwrap_or("any");
                return Err(MarketError::Incompatible(format!(
                    "'{}' {} needs host version {} to {}, found {}",
                    plugin.slug, plugin.version, plugin.min_version, max, host
                )));
            }
        }
        Ok(())
    }

    async fn stage_artifact(
        &self,
        meta: &PackageMetadata,
        reporter: &dyn InstallReporter,
    ) -> MarketResult<(StagedFile, u64)> {
        let slug = meta.slug();
        let path = staging_path(&self.config.scratch_dir, meta.kind(), slug, meta.version())?;
        ensure_dir(&self.config.scratch_dir).await?;

        let staged = StagedFile::new(path);
        let on_progress = |p: &DownloadProgress| reporter.progress(slug, p);
        let bytes = download_to(
            self.catalog.http(),
            meta.download_url(),
            staged.path(),
            Some(&on_progress),
        )
        .await?;
        Ok((staged, bytes))
    }

    async fn unpack(&self, kind: PackageKind, slug: &str, archive: &Path) -> MarketResult<PathBuf> {
        let root = self.config.install_root(kind);
        let archive = archive.to_path_buf();
        let slug = slug.to_string();
        tokio::task::spawn_blocking(move || install_archive(&archive, &root, &slug))
            .await
            .map_err(|e| MarketError::Extraction(format!("extraction task failed: {}", e)))?
    }

    async fn place_theme(&self, slug: &str, staged: &Path) -> MarketResult<PathBuf> {
        let root = self.config.install_root(PackageKind::Theme);
        ensure_dir(&root).await?;
        let target = self.package_path(PackageKind::Theme, slug);
        move_file(staged, &target).await?;
        Ok(target)
    }
}
