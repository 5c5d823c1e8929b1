//! Read-only client for the marketplace catalog, plus the two write paths
//! it exposes: review submission and download telemetry.

pub mod query;
pub mod request;

use crate::error::{MarketError, MarketResult};
use crate::types::package::{IconPack, PackageKind, PackageMetadata, Page, Plugin, Theme};
use crate::types::review::{MAX_RATING, MIN_RATING, NewReview, Review, ReviewSort};
use crate::utils::config::MarketConfig;
use crate::utils::logger::Logger;
use crate::utils::slug::validate_slug;
use query::{ListFilter, list_params};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_FEATURED_LIMIT: u32 = 5;
pub const DEFAULT_REVIEW_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPage<T> {
    items: Vec<T>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    has_more: bool,
}

impl<T> From<RawPage<T>> for Page<T> {
    fn from(raw: RawPage<T>) -> Self {
        let total = raw.total.unwrap_or(raw.items.len() as u64);
        Page {
            items: raw.items,
            total,
            has_more: raw.has_more,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    base: Url,
}

impl CatalogClient {
    pub fn new(config: &MarketConfig) -> MarketResult<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MarketError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(CatalogClient {
            http,
            base: config.catalog_base_url.clone(),
        })
    }

    /// The underlying HTTP client, shared with the artifact downloader.
    pub fn http(&self) -> &Client {
        &self.http
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // The base is checked to be a hierarchical URL when the config is built.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> MarketResult<T> {
        Logger::new().debug(&format!("GET {}", url));
        let response = self.http.get(url).send().await?;
        let response = request::check_status(response, what).await?;
        request::read_json(response, what).await
    }

    /// Lists packages of one kind. Filters that do not apply to the kind's
    /// endpoint are dropped.
    pub async fn list(
        &self,
        kind: PackageKind,
        filter: &ListFilter,
    ) -> MarketResult<Page<PackageMetadata>> {
        let mut url = self.endpoint(&[kind.collection()]);
        let params = list_params(kind, filter);
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }

        let what = format!("{} listing", kind);
        Ok(match kind {
            PackageKind::Plugin => Page::from(self.get_json::<RawPage<Plugin>>(url, &what).await?)
                .map(PackageMetadata::Plugin),
            PackageKind::IconPack => {
                Page::from(self.get_json::<RawPage<IconPack>>(url, &what).await?)
                    .map(PackageMetadata::IconPack)
            }
            PackageKind::Theme => Page::from(self.get_json::<RawPage<Theme>>(url, &what).await?)
                .map(PackageMetadata::Theme),
        })
    }

    /// Fetches one package by slug; `NotFound` when the catalog has no match.
    pub async fn get(&self, kind: PackageKind, slug: &str) -> MarketResult<PackageMetadata> {
        let slug = validate_slug(slug)?;
        let url = self.endpoint(&[kind.collection(), slug]);
        let what = format!("{} '{}'", kind, slug);

        let meta = match kind {
            PackageKind::Plugin => PackageMetadata::Plugin(self.get_json(url, &what).await?),
            PackageKind::IconPack => PackageMetadata::IconPack(self.get_json(url, &what).await?),
            PackageKind::Theme => PackageMetadata::Theme(self.get_json(url, &what).await?),
        };

        if meta.slug() != slug {
            return Err(MarketError::Protocol(format!(
                "asked for {} but the catalog answered with '{}'",
                what,
                meta.slug()
            )));
        }
        Ok(meta)
    }

    /// Featured packages. The themes endpoint has no featured listing, so
    /// the full list is filtered on its `featured` flag instead.
    pub async fn featured(
        &self,
        kind: PackageKind,
        limit: Option<u32>,
    ) -> MarketResult<Vec<PackageMetadata>> {
        let what = format!("featured {}", kind.collection());
        match kind {
            PackageKind::Plugin => {
                let mut url = self.endpoint(&[kind.collection(), "featured"]);
                url.query_pairs_mut().append_pair(
                    "limit",
                    &limit.unwrap_or(DEFAULT_FEATURED_LIMIT).to_string(),
                );
                let items: Vec<Plugin> = self.get_json(url, &what).await?;
                Ok(items.into_iter().map(PackageMetadata::Plugin).collect())
            }
            PackageKind::IconPack => {
                let url = self.endpoint(&[kind.collection(), "featured"]);
                let items: Vec<IconPack> = self.get_json(url, &what).await?;
                Ok(items.into_iter().map(PackageMetadata::IconPack).collect())
            }
            PackageKind::Theme => {
                let page = self.list(kind, &ListFilter::default()).await?;
                let featured = page.items.into_iter().filter(|t| t.is_featured());
                Ok(match limit {
                    Some(n) => featured.take(n as usize).collect(),
                    None => featured.collect(),
                })
            }
        }
    }

    pub async fn reviews(
        &self,
        item_id: &str,
        sort: ReviewSort,
        limit: Option<u32>,
    ) -> MarketResult<Vec<Review>> {
        let mut url = self.endpoint(&["reviews", item_id]);
        url.query_pairs_mut()
            .append_pair("sort", sort.as_str())
            .append_pair("limit", &limit.unwrap_or(DEFAULT_REVIEW_LIMIT).to_string());
        self.get_json(url, &format!("reviews for '{}'", item_id))
            .await
    }

    /// Posts a review. Only the rating bound is checked locally; everything
    /// else is the server's call.
    pub async fn submit_review(&self, review: &NewReview, token: Option<&str>) -> MarketResult<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
            return Err(MarketError::Validation(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, review.rating
            )));
        }

        let url = self.endpoint(&["reviews"]);
        let mut req = self.http.post(url).json(review);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let response = req.send().await?;
        request::check_status(response, &format!("review for '{}'", review.item_id)).await?;
        Ok(())
    }

    /// Records a download for the catalog's statistics. Best effort: any
    /// failure is logged and dropped, never returned.
    pub async fn track_download(&self, item_id: &str, kind: PackageKind, version: &str) {
        let url = self.endpoint(&["downloads"]);
        let payload = json!({
            "itemId": item_id,
            "itemType": kind.as_str(),
            "version": version,
        });

        let outcome = match self.http.post(url).json(&payload).send().await {
            Ok(response) => request::check_status(response, "download tracking")
                .await
                .map(|_| ()),
            Err(e) => Err(MarketError::from(e)),
        };

        if let Err(e) = outcome {
            Logger::new().warn(&format!(
                "Failed to track download of {} {}: {}",
                kind, item_id, e
            ));
        }
    }
}
