use std::path::{Path, PathBuf};

mod backend_bridge;
mod controller;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::load_settings;
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::GarmentType;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::{DesktopGuiApp, StartupConfig};

const SETTINGS_FILE_NAME: &str = "tryon.toml";
const SETTINGS_DIR_NAME: &str = "virtual-tryon";

#[derive(Debug, Parser)]
#[command(name = "desktop_gui", about = "Virtual try-on desktop client")]
struct Args {
    /// Base URL of the try-on service, e.g. http://localhost:5001
    #[arg(long)]
    server_url: Option<String>,
    /// Settings file; defaults to ./tryon.toml, then the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Garment type preselected in the UI (top, bottom or dress)
    #[arg(long)]
    garment_type: Option<GarmentType>,
}

/// First existing settings file among the working directory and the user config dir.
fn find_settings_file(working_dir: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = vec![working_dir.join(SETTINGS_FILE_NAME)];
    if let Some(config_dir) = config_dir {
        candidates.push(config_dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME));
    }
    candidates.into_iter().find(|path| path.is_file())
}

fn build_startup(args: Args) -> anyhow::Result<StartupConfig> {
    let settings_source = match args.config {
        Some(path) => Some(path),
        None => {
            let working_dir =
                std::env::current_dir().context("failed to resolve working directory")?;
            find_settings_file(&working_dir, dirs::config_dir().as_deref())
        }
    };

    let mut settings = load_settings(settings_source.as_deref()).with_context(|| {
        match &settings_source {
            Some(path) => format!("failed to load settings from {}", path.display()),
            None => "failed to load settings".to_string(),
        }
    })?;
    if let Some(server_url) = args.server_url {
        settings.api_base_url = server_url;
    }
    if let Some(garment_type) = args.garment_type {
        settings.default_garment_type = garment_type;
    }
    settings.validate()?;

    Ok(StartupConfig {
        settings,
        settings_source,
    })
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let startup = match build_startup(Args::parse()) {
        Ok(startup) => startup,
        Err(err) => {
            tracing::error!("invalid configuration: {err:#}");
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };
    tracing::info!(
        server_url = %startup.settings.api_base_url,
        settings = ?startup.settings_source,
        "starting virtual try-on client"
    );

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(cmd_rx, ui_tx, startup.settings.clone());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Virtual Try-On")
            .with_inner_size([1100.0, 860.0])
            .with_min_inner_size([760.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Virtual Try-On",
        options,
        Box::new(|_cc| Ok(Box::new(DesktopGuiApp::bootstrap(cmd_tx, ui_rx, startup)))),
    )
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn working_directory_settings_win_over_config_dir() {
        let cwd = tempfile::tempdir().expect("cwd");
        let config = tempfile::tempdir().expect("config");
        let user_file = config.path().join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME);
        fs::create_dir_all(user_file.parent().expect("parent")).expect("mkdir");
        fs::write(&user_file, "").expect("write");

        assert_eq!(
            find_settings_file(cwd.path(), Some(config.path())),
            Some(user_file)
        );

        let local_file = cwd.path().join(SETTINGS_FILE_NAME);
        fs::write(&local_file, "").expect("write");
        assert_eq!(
            find_settings_file(cwd.path(), Some(config.path())),
            Some(local_file)
        );
    }

    #[test]
    fn no_settings_file_means_defaults() {
        let cwd = tempfile::tempdir().expect("cwd");
        assert_eq!(find_settings_file(cwd.path(), None), None);
    }

    #[test]
    fn command_line_overrides_settings() {
        let dir = tempfile::tempdir().expect("dir");
        let path = dir.path().join("custom.toml");
        fs::write(&path, "api_base_url = \"http://10.0.0.5:5001\"\n").expect("write");

        let args = Args::parse_from([
            "desktop_gui",
            "--config",
            path.to_str().expect("utf8 path"),
            "--server-url",
            "https://staging.tryon.example.com",
            "--garment-type",
            "dress",
        ]);
        let startup = build_startup(args).expect("startup");

        assert_eq!(
            startup.settings.api_base_url,
            "https://staging.tryon.example.com"
        );
        assert_eq!(startup.settings.default_garment_type, GarmentType::Dress);
        assert_eq!(startup.settings_source, Some(path));
    }

    #[test]
    fn rejects_unknown_garment_type() {
        assert!(Args::try_parse_from(["desktop_gui", "--garment-type", "hat"]).is_err());
    }
}
