use crate::{
    catalog::query::{ListFilter, SortOrder},
    install::Installer,
    types::{package::PackageKind, review::ReviewSort},
    utils::{
        auth::resolve_session_token,
        config::{ConfigFile, MarketConfig, Overrides, config_file_path, load_config_file, resolve},
        signature::get_signature,
        version::get_version,
    },
};
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io;

mod catalog;
mod commands;
mod error;
mod install;
mod types;
mod utils;

#[derive(Parser)]
#[command(name = "scribepack")]
#[command(author = "GitScribe")]
#[command(about = "Browse, install and review GitScribe plugins, icon packs and themes")]
struct Cli {
    /// Catalog base URL (overrides SCRIBEPACK_CATALOG_URL and config.toml)
    #[arg(long, global = true)]
    catalog_url: Option<String>,

    /// Directory holding installed packages (overrides SCRIBEPACK_DATA_DIR and config.toml)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Browse {
        #[arg(value_enum)]
        kind: PackageKind,
        /// Plugin category
        #[arg(long)]
        category: Option<String>,
        /// Plugin tag
        #[arg(long)]
        tag: Option<String>,
        /// Icon pack style
        #[arg(long)]
        style: Option<String>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
        /// Only verified plugins
        #[arg(long, default_value_t = false)]
        verified: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show featured packages
    Featured {
        #[arg(value_enum)]
        kind: PackageKind,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Show details for one package
    Info {
        #[arg(value_enum)]
        kind: PackageKind,
        slug: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Install one or more packages
    Install {
        #[arg(value_enum)]
        kind: PackageKind,
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Download and verify a package without installing it
    Download {
        #[arg(value_enum)]
        kind: PackageKind,
        slug: String,
        /// Target directory (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Remove an installed package
    Uninstall {
        #[arg(value_enum)]
        kind: PackageKind,
        slug: String,
        /// Skip the confirmation prompt
        #[arg(short, long, default_value_t = false)]
        yes: bool,
    },

    /// List installed packages
    List {
        #[arg(long, value_enum)]
        kind: Option<PackageKind>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Read reviews for a catalog item
    Reviews {
        /// Catalog item id
        item_id: String,
        #[arg(long, value_enum, default_value_t = ReviewSort::Recent)]
        sort: ReviewSort,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Submit a review (prompts for anything not given)
    Review {
        #[arg(value_enum)]
        kind: PackageKind,
        /// Catalog item id
        item_id: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,
        #[arg(long)]
        comment: Option<String>,
        /// Session token (overrides SCRIBEPACK_TOKEN and config.toml)
        #[arg(long)]
        token: Option<String>,
    },
}

fn load_settings(cli: &Cli) -> io::Result<(MarketConfig, ConfigFile)> {
    let file = match config_file_path() {
        Some(path) => load_config_file(&path).map_err(io::Error::other)?,
        None => ConfigFile::default(),
    };
    let overrides = Overrides {
        catalog_url: cli.catalog_url.clone(),
        data_dir: cli.data_dir.clone(),
    };
    let config = resolve(&overrides, &file, |key| env::var(key).ok()).map_err(io::Error::other)?;
    Ok((config, file))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let version = get_version();
    let signature = get_signature(&version);

    let version_static: &'static str = Box::leak(format!("v{}", version).into_boxed_str());
    let signature_static: &'static str = Box::leak(signature.into_boxed_str());

    let mut cmd = Cli::command();
    cmd = cmd.version(version_static).before_help(signature_static);

    let raw_args: Vec<String> = std::env::args().collect();
    if raw_args.iter().any(|a| a == "--version" || a == "-V") {
        println!("{}", signature_static);
        return Ok(());
    }

    let matches = cmd.get_matches();
    let cli: Cli = Cli::from_arg_matches(&matches)
        .map_err(|e| io::Error::other(format!("Failed to parse arguments: {}", e)))?;

    let (config, file) = load_settings(&cli)?;
    let installer = Installer::new(config).map_err(io::Error::other)?;

    match cli.command {
        Commands::Browse {
            kind,
            category,
            tag,
            style,
            search,
            sort,
            verified,
            limit,
            offset,
            json,
        } => {
            let filter = ListFilter {
                category,
                tag,
                style,
                search,
                sort,
                verified: verified.then_some(true),
                limit,
                offset,
            };
            if let Err(e) =
                commands::browse::browse(installer.catalog(), kind, &filter, json).await
            {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Featured { kind, limit, json } => {
            if let Err(e) =
                commands::browse::featured(installer.catalog(), kind, limit, json).await
            {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Info { kind, slug, json } => {
            if let Err(e) = commands::browse::info(&installer, kind, &slug, json).await {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Install { kind, slugs } => {
            if let Err(e) = commands::install::install(Arc::new(installer), kind, slugs).await {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Download { kind, slug, out } => {
            let out = match out {
                Some(dir) => dir,
                None => env::current_dir()
                    .map_err(|e| io::Error::other(format!("Failed to get current dir: {}", e)))?,
            };
            if let Err(e) = commands::install::download(&installer, kind, &slug, &out).await {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Uninstall { kind, slug, yes } => {
            if let Err(e) = commands::manage::uninstall(&installer, kind, &slug, yes).await {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::List { kind, json } => {
            if let Err(e) = commands::manage::list(&installer, kind, json).await {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Reviews {
            item_id,
            sort,
            limit,
            json,
        } => {
            if let Err(e) = commands::review::list_reviews(
                installer.catalog(),
                &item_id,
                sort,
                limit,
                json,
            )
            .await
            {
                return Err(io::Error::other(e));
            }

            Ok(())
        }

        Commands::Review {
            kind,
            item_id,
            rating,
            comment,
            token,
        } => {
            let token = resolve_session_token(token, &file, |key| env::var(key).ok());
            if let Err(e) = commands::review::submit_review(
                installer.catalog(),
                kind,
                &item_id,
                rating,
                comment,
                token,
            )
            .await
            {
                return Err(io::Error::other(e));
            }

            Ok(())
        }
    }
}
