use crate::error::{MarketError, MarketResult};

const MAX_SLUG_LEN: usize = 128;

/// Checks that a catalog slug is safe to use as a single path component.
///
/// Slugs come from the network and from the command line, so they are
/// restricted to `[A-Za-z0-9._-]`, must not start with a dot (hidden entries
/// in the install roots are reserved for in-flight extractions) and must not
/// be `.` or `..`.
pub fn validate_slug(slug: &str) -> MarketResult<&str> {
    let valid = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('.')
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(slug)
    } else {
        Err(MarketError::InvalidSlug(slug.to_string()))
    }
}

/// Same rules for the version string embedded in staging file names.
pub fn validate_version_component(version: &str) -> MarketResult<&str> {
    let valid = !version.is_empty()
        && version.len() <= MAX_SLUG_LEN
        && !version.starts_with('.')
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'));

    if valid {
        Ok(version)
    } else {
        Err(MarketError::Protocol(format!(
            "version '{}' is not usable in a file name",
            version
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_slugs() {
        for slug in ["dark-mode-pro", "neon_city", "pack.v2", "a"] {
            assert!(validate_slug(slug).is_ok(), "{slug} should be valid");
        }
    }

    #[test]
    fn rejects_traversal_and_separators() {
        for slug in [
            "",
            ".",
            "..",
            "../etc",
            "a/b",
            "a\\b",
            "/abs",
            ".hidden",
            "C:evil",
            "sp ace",
        ] {
            assert!(
                matches!(validate_slug(slug), Err(MarketError::InvalidSlug(_))),
                "{slug:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overlong_slugs() {
        let long = "x".repeat(MAX_SLUG_LEN + 1);
        assert!(validate_slug(&long).is_err());
    }

    #[test]
    fn version_allows_build_metadata() {
        assert!(validate_version_component("2.1.0+build.7").is_ok());
        assert!(validate_version_component("../1.0").is_err());
    }
}
