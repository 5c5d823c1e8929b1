use super::print_json;
use crate::catalog::CatalogClient;
use crate::catalog::query::ListFilter;
use crate::install::Installer;
use crate::types::package::{PackageKind, PackageMetadata, Page};
use crate::utils::logger::Logger;
use crate::utils::spinner::run_step;
use anyhow::Context;

fn print_rows(items: &[PackageMetadata]) {
    for item in items {
        let verified = if item.author().verified { " ✓" } else { "" };
        println!(
            "- {:<28} v{:<10} ★ {:.1}  ⤓ {:<8} {} by {}{}",
            item.slug(),
            item.version(),
            item.rating(),
            item.downloads(),
            item.name(),
            item.author().name,
            verified
        );
    }
}

pub async fn browse(
    catalog: &CatalogClient,
    kind: PackageKind,
    filter: &ListFilter,
    json: bool,
) -> anyhow::Result<()> {
    let page = run_step(
        &format!("Fetching {}...", kind.collection()),
        |page: &Page<PackageMetadata>| {
            format!("Fetched {} of {} {}", page.items.len(), page.total, kind.collection())
        },
        catalog.list(kind, filter),
    )
    .await
    .with_context(|| format!("Failed to list {}", kind.collection()))?;

    if json {
        return print_json(&page.items);
    }

    if page.items.is_empty() {
        Logger::new().info(&format!("No {} match these filters", kind.collection()));
        return Ok(());
    }
    print_rows(&page.items);
    if page.has_more {
        let next = filter.offset.unwrap_or(0) as usize + page.items.len();
        println!();
        println!("More results available, continue with --offset {}", next);
    }
    Ok(())
}

pub async fn featured(
    catalog: &CatalogClient,
    kind: PackageKind,
    limit: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let items = catalog
        .featured(kind, limit)
        .await
        .with_context(|| format!("Failed to fetch featured {}", kind.collection()))?;

    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        Logger::new().info(&format!("No featured {} right now", kind.collection()));
        return Ok(());
    }
    print_rows(&items);
    Ok(())
}

pub async fn info(
    installer: &Installer,
    kind: PackageKind,
    slug: &str,
    json: bool,
) -> anyhow::Result<()> {
    let meta = installer
        .catalog()
        .get(kind, slug)
        .await
        .with_context(|| format!("Failed to fetch {} '{}'", kind, slug))?;

    if json {
        return print_json(&meta);
    }

    let installed = installer.is_installed(kind, slug).await?;

    println!();
    println!("{} ({})", meta.name(), meta.slug());
    println!("⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯⎯");
    println!("Kind:        {}", kind);
    println!("Version:     {}", meta.version());
    println!("Author:      {}", meta.author().name);
    println!("Rating:      {:.1}", meta.rating());
    println!("Downloads:   {}", meta.downloads());
    if meta.package_size() > 0 {
        println!("Size:        {} bytes", meta.package_size());
    }
    match &meta {
        PackageMetadata::Plugin(p) => {
            println!("Category:    {}", p.category);
            if !p.min_version.is_empty() {
                let max = p.max_version.as_deref().unwrap_or("latest");
                println!("Requires:    GitScribe {} to {}", p.min_version, max);
            }
            if !p.permissions.is_empty() {
                println!("Permissions: {}", p.permissions.join(", "));
            }
            if p.deprecated {
                Logger::new().warn("This plugin is deprecated");
            }
        }
        PackageMetadata::IconPack(p) => println!("Style:       {}", p.style),
        PackageMetadata::Theme(t) => {
            if !t.colors.is_empty() {
                println!("Colors:      {} entries", t.colors.len());
            }
        }
    }
    println!("Installed:   {}", if installed { "yes" } else { "no" });
    println!();
    println!("{}", meta.description());
    Ok(())
}
