pub mod browse;
pub mod install;
pub mod manage;
pub mod review;

use crate::types::package::PackageKind;
use serde::Serialize;

const ALL_KINDS: [PackageKind; 3] = [
    PackageKind::Plugin,
    PackageKind::IconPack,
    PackageKind::Theme,
];

/// `Some(kind)` narrows to one kind, `None` means all of them.
pub fn kinds_or_all(kind: Option<PackageKind>) -> Vec<PackageKind> {
    match kind {
        Some(k) => vec![k],
        None => ALL_KINDS.to_vec(),
    }
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
