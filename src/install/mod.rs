//! Download, verify and unpack pipeline for marketplace packages.

pub mod download;
pub mod extract;
pub mod installer;
pub mod staging;
pub mod verify;

pub use installer::{InstallReporter, InstallStage, Installer, NoopReporter};
