use crate::error::{MarketError, MarketResult};
use crate::types::package::PackageKind;
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CATALOG_URL: &str = "https://gitscribe.dev/api/marketplace";
pub const CATALOG_URL_ENV: &str = "SCRIBEPACK_CATALOG_URL";
pub const DATA_DIR_ENV: &str = "SCRIBEPACK_DATA_DIR";
pub const TOKEN_ENV: &str = "SCRIBEPACK_TOKEN";

const APP_DIR: &str = "GitScribe";
const CONFIG_DIR: &str = "scribepack";

/// Everything the catalog client and installer need to know about their
/// environment. Built once and passed in, never read from globals.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub catalog_base_url: Url,
    pub data_root: PathBuf,
    pub scratch_dir: PathBuf,
    pub host_version: Option<String>,
    pub user_agent: String,
}

impl MarketConfig {
    pub fn new(catalog_base_url: &str, data_root: impl Into<PathBuf>) -> MarketResult<Self> {
        let url = Url::parse(catalog_base_url).map_err(|e| {
            MarketError::Config(format!("invalid catalog URL '{}': {}", catalog_base_url, e))
        })?;
        if url.cannot_be_a_base() {
            return Err(MarketError::Config(format!(
                "catalog URL '{}' cannot be used as a base",
                catalog_base_url
            )));
        }

        Ok(MarketConfig {
            catalog_base_url: url,
            data_root: data_root.into(),
            scratch_dir: std::env::temp_dir().join(CONFIG_DIR),
            host_version: None,
            user_agent: format!("scribepack/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_host_version(mut self, version: Option<String>) -> Self {
        self.host_version = version;
        self
    }

    /// Base directory holding every installed package of `kind`.
    pub fn install_root(&self, kind: PackageKind) -> PathBuf {
        self.data_root.join(kind.collection())
    }
}

/// Optional `config.toml` in the user's config directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub catalog_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub session: Option<String>,
    pub host_version: Option<String>,
    /// Where downloads are staged before verification.
    pub scratch_dir: Option<PathBuf>,
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
}

/// Reads a config file; a missing file is an empty config.
pub fn load_config_file(path: &Path) -> MarketResult<ConfigFile> {
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    let text = std::fs::read_to_string(path).map_err(|e| MarketError::fs(path, e))?;
    toml::from_str(&text)
        .map_err(|e| MarketError::Config(format!("invalid {}: {}", path.display(), e)))
}

pub fn default_data_root() -> MarketResult<PathBuf> {
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or_else(|| MarketError::Config("Failed to locate the user data directory".to_string()))
}

/// Settings given on the command line, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub catalog_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

/// Resolves flag → environment → config file → default for each setting.
/// `env` is the environment lookup, injected so tests need not mutate the
/// process environment.
pub fn resolve<F>(overrides: &Overrides, file: &ConfigFile, env: F) -> MarketResult<MarketConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let catalog_url = overrides
        .catalog_url
        .clone()
        .or_else(|| env(CATALOG_URL_ENV))
        .or_else(|| file.catalog_url.clone())
        .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());

    let data_root = match overrides
        .data_dir
        .clone()
        .or_else(|| env(DATA_DIR_ENV).map(PathBuf::from))
        .or_else(|| file.data_dir.clone())
    {
        Some(dir) => dir,
        None => default_data_root()?,
    };

    let mut config =
        MarketConfig::new(&catalog_url, data_root)?.with_host_version(file.host_version.clone());
    if let Some(dir) = &file.scratch_dir {
        config = config.with_scratch_dir(dir);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn flags_beat_env_beats_file() {
        let file = ConfigFile {
            catalog_url: Some("https://file.example/api".into()),
            data_dir: Some("/from/file".into()),
            ..Default::default()
        };
        let env = env_from(&[(CATALOG_URL_ENV, "https://env.example/api")]);

        let cfg = resolve(&Overrides::default(), &file, &env).unwrap();
        assert_eq!(cfg.catalog_base_url.as_str(), "https://env.example/api");
        assert_eq!(cfg.data_root, PathBuf::from("/from/file"));

        let flags = Overrides {
            catalog_url: Some("https://flag.example/api".into()),
            data_dir: Some("/from/flag".into()),
        };
        let cfg = resolve(&flags, &file, &env).unwrap();
        assert_eq!(cfg.catalog_base_url.as_str(), "https://flag.example/api");
        assert_eq!(cfg.data_root, PathBuf::from("/from/flag"));
    }

    #[test]
    fn falls_back_to_default_catalog() {
        let cfg = resolve(
            &Overrides {
                data_dir: Some("/data".into()),
                ..Default::default()
            },
            &ConfigFile::default(),
            env_from(&[]),
        )
        .unwrap();
        assert_eq!(cfg.catalog_base_url.as_str(), DEFAULT_CATALOG_URL);
        assert_eq!(cfg.install_root(PackageKind::IconPack), PathBuf::from("/data/icon-packs"));
    }

    #[test]
    fn rejects_unusable_catalog_url() {
        assert!(matches!(
            MarketConfig::new("not a url", "/data"),
            Err(MarketError::Config(_))
        ));
        assert!(matches!(
            MarketConfig::new("mailto:someone@example.com", "/data"),
            Err(MarketError::Config(_))
        ));
    }

    #[test]
    fn parses_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "catalog_url = \"https://mirror.example/api\"\nsession = \"tok\"\nhost_version = \"3.2.0\"\n",
        )
        .unwrap();
        let file = load_config_file(&path).unwrap();
        assert_eq!(file.session.as_deref(), Some("tok"));
        assert_eq!(file.host_version.as_deref(), Some("3.2.0"));

        let missing = load_config_file(&dir.path().join("nope.toml")).unwrap();
        assert!(missing.catalog_url.is_none());
    }

    #[test]
    fn file_can_move_the_scratch_dir() {
        let file = ConfigFile {
            data_dir: Some("/data".into()),
            scratch_dir: Some("/fast/scratch".into()),
            host_version: Some("3.2.0".into()),
            ..Default::default()
        };
        let cfg = resolve(&Overrides::default(), &file, env_from(&[])).unwrap();
        assert_eq!(cfg.scratch_dir, PathBuf::from("/fast/scratch"));
        assert_eq!(cfg.host_version.as_deref(), Some("3.2.0"));
    }
}
