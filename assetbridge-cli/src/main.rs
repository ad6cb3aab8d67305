use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use assetbridge_core::{
    BridgeConfig, ManifestStore, PathResolver, MANIFEST_FILE_NAME,
};

mod ui;

/// Assets Bridge CLI - inspect and configure the content bridge
#[derive(Parser)]
#[command(
    name = "assetbridge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect the export manifest and configure the Assets Bridge settings",
    arg_required_else_help = true
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to the settings file
    #[arg(long, global = true, default_value = "AssetsBridge.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or validate the export manifest at the export root
    Manifest {
        /// Validate only, without listing elements
        #[arg(long)]
        validate: bool,
    },

    /// Classify a library path as system-owned or user-owned
    Classify {
        /// Library path, for example /Engine/BasicShapes/Cube
        path: String,
    },

    /// Show or change the bridge settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Set the on-disk content library root
    SetLibraryRoot { path: String },
    /// Set the on-disk export root
    SetExportRoot { path: String },
}

fn main() {
    let cli = Cli::parse();

    colored::control::set_override(!cli.no_color);
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        ui::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = BridgeConfig::load(&cli.settings)?;

    match &cli.command {
        Commands::Manifest { validate } => show_manifest(&config, *validate),
        Commands::Classify { path } => classify(&config, path),
        Commands::Settings { action } => settings(config, &cli.settings, action.as_ref()),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(format!("assetbridge_core={level},assetbridge_cli={level}"))
        .with_target(false)
        .try_init();
}

fn show_manifest(config: &BridgeConfig, validate_only: bool) -> Result<()> {
    let export_root = config.require_export_root()?;
    let path = export_root.join(MANIFEST_FILE_NAME);
    let manifest = ManifestStore::read(&path)
        .with_context(|| format!("no readable manifest at '{}'", path.display()))?;

    match manifest.ensure_supported_operation() {
        Ok(()) => ui::success(&format!(
            "manifest '{}' is valid ({} object(s), operation '{}')",
            path.display(),
            manifest.objects.len(),
            manifest.operation
        )),
        Err(e) => ui::warning(&e.to_string()),
    }
    if validate_only {
        return Ok(());
    }

    for element in &manifest.objects {
        println!();
        ui::field("ShortName", &element.short_name);
        ui::field("InternalPath", &element.internal_path);
        ui::field("ObjectType", element.object_type.as_str());
        ui::field("ExportLocation", &element.export_location);
        if !Path::new(&element.export_location).exists() {
            ui::warning("  interchange file is missing on disk");
        }
        for slot in &element.materials {
            ui::field(
                &format!("  Material[{}]", slot.index),
                &format!("{} -> {}", slot.name, slot.internal_path),
            );
        }
    }
    Ok(())
}

fn classify(config: &BridgeConfig, path: &str) -> Result<()> {
    let resolver = PathResolver::new(config);
    if resolver.is_system_path(path) {
        ui::warning(&format!(
            "'{path}' is system-owned; it will be duplicated before export"
        ));
    } else {
        ui::success(&format!("'{path}' is user-owned"));
    }
    ui::info(&format!(
        "stripped of virtual roots: '{}'",
        resolver.strip_virtual_roots(path)
    ));
    Ok(())
}

fn settings(
    mut config: BridgeConfig,
    settings_path: &Path,
    action: Option<&SettingsAction>,
) -> Result<()> {
    match action {
        None => {
            ui::info(&format!("settings from '{}'", settings_path.display()));
            ui::field("library_root", &config.library_root);
            ui::field("export_root", &config.export_root);
            ui::field("library_mount", &config.library_mount);
            ui::field("protected", &config.protected_prefixes.join(", "));
        }
        Some(SettingsAction::SetLibraryRoot { path }) => {
            config.library_root = path.clone();
            config.save(settings_path)?;
            ui::success(&format!("library root set to '{path}'"));
        }
        Some(SettingsAction::SetExportRoot { path }) => {
            config.export_root = path.clone();
            config.save(settings_path)?;
            ui::success(&format!("export root set to '{path}'"));
        }
    }
    Ok(())
}
