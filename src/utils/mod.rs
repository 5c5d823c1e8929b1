pub mod auth;
pub mod config;
pub mod fs;
pub mod logger;
pub mod semver;
pub mod signature;
pub mod slug;
pub mod spinner;
pub mod version;
