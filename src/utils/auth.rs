use crate::utils::config::{ConfigFile, TOKEN_ENV};

/// Picks the bearer token for review submission: explicit flag, then
/// `SCRIBEPACK_TOKEN`, then the `session` key of the config file.
pub fn resolve_session_token<F>(flag: Option<String>, file: &ConfigFile, env: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    flag.or_else(|| env(TOKEN_ENV))
        .or_else(|| file.session.clone())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
