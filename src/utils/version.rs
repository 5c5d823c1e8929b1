/// Returns the CLI version: `SCRIBEPACK_CLI_VERSION` when set (packagers
/// stamp release builds this way), otherwise the crate version.
pub fn get_version() -> String {
    if let Ok(v) = std::env::var("SCRIBEPACK_CLI_VERSION") {
        if !v.trim().is_empty() {
            return v.trim().to_string();
        }
    }

    env!("CARGO_PKG_VERSION").to_string()
}
