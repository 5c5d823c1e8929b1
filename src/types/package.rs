use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The three kinds of distributable packages the marketplace serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PackageKind {
    Plugin,
    IconPack,
    Theme,
}

impl PackageKind {
    /// Wire name used in review and telemetry payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Plugin => "plugin",
            PackageKind::IconPack => "icon-pack",
            PackageKind::Theme => "theme",
        }
    }

    /// REST collection segment, also the install-root directory name.
    pub fn collection(&self) -> &'static str {
        match self {
            PackageKind::Plugin => "plugins",
            PackageKind::IconPack => "icon-packs",
            PackageKind::Theme => "themes",
        }
    }

    pub fn artifact_extension(&self) -> &'static str {
        match self {
            PackageKind::Plugin => "gspl",
            PackageKind::IconPack => "zip",
            PackageKind::Theme => "json",
        }
    }

    /// Themes are plain JSON files installed as-is; the others are archives.
    pub fn is_archive(&self) -> bool {
        !matches!(self, PackageKind::Theme)
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    #[default]
    All,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub long_description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub author: Author,
    pub download_url: String,
    #[serde(default)]
    pub package_size: u64,
    pub checksum: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub min_version: String,
    #[serde(default)]
    pub max_version: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconPack {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub author: Author,
    pub download_url: String,
    #[serde(default)]
    pub package_size: u64,
    pub checksum: String,
    #[serde(default)]
    pub preview_url: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub is_default: bool,
}

// Themes ship no checksum; see DESIGN.md on the unverified theme path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub author: Author,
    pub download_url: String,
    #[serde(default)]
    pub package_size: u64,
    #[serde(default)]
    pub screenshot_url: String,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured: bool,
}

/// Catalog record for one package, tagged by kind.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PackageMetadata {
    Plugin(Plugin),
    IconPack(IconPack),
    Theme(Theme),
}

impl PackageMetadata {
    pub fn kind(&self) -> PackageKind {
        match self {
            PackageMetadata::Plugin(_) => PackageKind::Plugin,
            PackageMetadata::IconPack(_) => PackageKind::IconPack,
            PackageMetadata::Theme(_) => PackageKind::Theme,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PackageMetadata::Plugin(p) => &p.id,
            PackageMetadata::IconPack(p) => &p.id,
            PackageMetadata::Theme(t) => &t.id,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            PackageMetadata::Plugin(p) => &p.slug,
            PackageMetadata::IconPack(p) => &p.slug,
            PackageMetadata::Theme(t) => &t.slug,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PackageMetadata::Plugin(p) => &p.name,
            PackageMetadata::IconPack(p) => &p.name,
            PackageMetadata::Theme(t) => &t.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            PackageMetadata::Plugin(p) => &p.description,
            PackageMetadata::IconPack(p) => &p.description,
            PackageMetadata::Theme(t) => &t.description,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            PackageMetadata::Plugin(p) => &p.version,
            PackageMetadata::IconPack(p) => &p.version,
            PackageMetadata::Theme(t) => &t.version,
        }
    }

    pub fn author(&self) -> &Author {
        match self {
            PackageMetadata::Plugin(p) => &p.author,
            PackageMetadata::IconPack(p) => &p.author,
            PackageMetadata::Theme(t) => &t.author,
        }
    }

    pub fn download_url(&self) -> &str {
        match self {
            PackageMetadata::Plugin(p) => &p.download_url,
            PackageMetadata::IconPack(p) => &p.download_url,
            PackageMetadata::Theme(t) => &t.download_url,
        }
    }

    pub fn package_size(&self) -> u64 {
        match self {
            PackageMetadata::Plugin(p) => p.package_size,
            PackageMetadata::IconPack(p) => p.package_size,
            PackageMetadata::Theme(t) => t.package_size,
        }
    }

    /// Expected SHA-256 of the artifact, when the catalog publishes one.
    pub fn checksum(&self) -> Option<&str> {
        match self {
            PackageMetadata::Plugin(p) => Some(&p.checksum),
            PackageMetadata::IconPack(p) => Some(&p.checksum),
            PackageMetadata::Theme(_) => None,
        }
    }

    pub fn rating(&self) -> f32 {
        match self {
            PackageMetadata::Plugin(p) => p.rating,
            PackageMetadata::IconPack(p) => p.rating,
            PackageMetadata::Theme(t) => t.rating,
        }
    }

    pub fn downloads(&self) -> u64 {
        match self {
            PackageMetadata::Plugin(p) => p.downloads,
            PackageMetadata::IconPack(p) => p.downloads,
            PackageMetadata::Theme(t) => t.downloads,
        }
    }

    pub fn is_featured(&self) -> bool {
        match self {
            PackageMetadata::Plugin(p) => p.featured,
            PackageMetadata::IconPack(p) => p.featured,
            PackageMetadata::Theme(t) => t.featured,
        }
    }
}

/// One page of a catalog listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            has_more: self.has_more,
        }
    }
}
