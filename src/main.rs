//! steamscout - Steam library folder and app manifest discovery
//!
//! Demo CLI entry point. Resolves the Steam installation root (from
//! `--root` or the settings file), prints the configured library folders,
//! and optionally resolves one app's manifest properties and absolute
//! install path, or lists every installed app.
//!
//! The core library performs no install-path discovery of its own: the
//! root printed and probed here is exactly the one supplied by flag or
//! configuration.

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use steamscout::{APP_NAME, ConfigManager, LibraryResolver, VERSION};

#[derive(Parser, Debug)]
#[command(name = "steamscout", version, about = "Inspect Steam libraries and app manifests")]
struct Cli {
    /// Steam installation root (overrides the configured value)
    #[arg(long)]
    root: Option<Utf8PathBuf>,

    /// App id to resolve (app ids are listed on https://steamdb.info/)
    #[arg(long)]
    app_id: Option<u32>,

    /// List every installed app across all libraries
    #[arg(long)]
    list: bool,

    /// Directory holding steamscout.yaml
    #[arg(long, default_value = "steamscout-data")]
    config_dir: Utf8PathBuf,

    /// Verbose debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigManager::new(&cli.config_dir)?;
    let settings = config.load_settings()?;

    let _guard = steamscout::logging::setup_logging(
        &settings.log_dir,
        APP_NAME,
        cli.debug || settings.debug_mode,
        false,
    )?;
    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let root = cli.root.clone().or_else(|| {
        if settings.steam_root.is_empty() {
            None
        } else {
            Some(Utf8PathBuf::from(&settings.steam_root))
        }
    });
    let Some(root) = root else {
        bail!("Steam installation not configured; pass --root or set \"Steam Root\" in steamscout.yaml");
    };

    println!("Steam is installed here: {}", root);

    let resolver = LibraryResolver::new(root);
    let libraries = resolver.library_paths()?;
    if libraries.len() > 1 {
        println!("Steam libraries are here:");
    } else {
        println!("Steam library is here:");
    }
    for library in &libraries {
        println!("  {}", library);
    }

    if cli.list {
        let apps = resolver.installed_apps()?;
        println!("Installed apps ({}):", apps.len());
        for app in apps {
            println!(
                "  {:>8}  {}  [{}]",
                app.app_id,
                app.name.as_deref().unwrap_or("<unnamed>"),
                app.install_path()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "no installdir".to_string()),
            );
        }
    }

    if let Some(app_id) = cli.app_id {
        println!("App manifest:");
        for property in ["appid", "name", "installdir"] {
            let value = resolver
                .manifest_property(app_id, property)
                .with_context(|| format!("Failed to resolve app {}", app_id))?;
            println!("  {}: {}", property, value);
        }

        let install_path = resolver
            .app_install_path(app_id)
            .with_context(|| format!("Failed to resolve install path for app {}", app_id))?;
        println!("  Absolute app installdir: {}", install_path);
    }

    Ok(())
}
