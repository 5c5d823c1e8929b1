use crate::types::package::PackageKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Popular,
    Recent,
    Rating,
    Name,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Popular => "popular",
            SortOrder::Recent => "recent",
            SortOrder::Rating => "rating",
            SortOrder::Name => "name",
        }
    }
}

/// Optional filters for a catalog listing. Unset fields are never sent.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub style: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortOrder>,
    pub verified: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Query parameters for `GET /<collection>`, restricted to the ones the
/// endpoint for `kind` understands. Values are raw; the caller's URL encoder
/// takes care of escaping.
pub fn list_params(kind: PackageKind, filter: &ListFilter) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = Vec::new();

    let mut push = |key: &'static str, value: Option<String>| {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            params.push((key, v));
        }
    };

    match kind {
        PackageKind::Plugin => {
            push("category", filter.category.clone());
            push("tag", filter.tag.clone());
            push("search", filter.search.clone());
            push("sort", filter.sort.map(|s| s.as_str().to_string()));
            push("verified", filter.verified.map(|v| v.to_string()));
            push("limit", filter.limit.map(|v| v.to_string()));
            push("offset", filter.offset.map(|v| v.to_string()));
        }
        PackageKind::IconPack => {
            push("style", filter.style.clone());
            push("search", filter.search.clone());
            push("sort", filter.sort.map(|s| s.as_str().to_string()));
            push("limit", filter.limit.map(|v| v.to_string()));
            push("offset", filter.offset.map(|v| v.to_string()));
        }
        PackageKind::Theme => {
            push("sort", filter.sort.map(|s| s.as_str().to_string()));
        }
    }

    params
}
