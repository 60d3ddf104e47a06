//! scm-export - Supreme Commander model export tool
//!
//! Converts host mesh/armature snapshots (JSON) into assembled SCM models.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use scm_export::{convert_snapshot, convert_to_model, Axis, ExportSettings, SceneSnapshot};

#[derive(Parser)]
#[command(name = "scm-export")]
#[command(about = "Supreme Commander model export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct SettingsArgs {
    /// Export settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forward axis (overrides settings)
    #[arg(long, allow_hyphen_values = true)]
    forward: Option<Axis>,

    /// Up axis (overrides settings)
    #[arg(long, allow_hyphen_values = true)]
    up: Option<Axis>,

    /// Info text stored in the model (overrides settings)
    #[arg(long)]
    info: Option<String>,
}

impl SettingsArgs {
    fn resolve(self) -> Result<ExportSettings> {
        let mut settings = match &self.config {
            Some(path) => ExportSettings::load(path)?,
            None => ExportSettings::default(),
        };
        if let Some(forward) = self.forward {
            settings.axis_forward = forward;
        }
        if let Some(up) = self.up {
            settings.axis_up = up;
        }
        if let Some(info) = self.info {
            settings.info = info;
        }
        Ok(settings)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a model from a scene snapshot
    Model {
        /// Input scene snapshot (JSON)
        input: PathBuf,

        /// Output model file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Run the export without writing anything
    Check {
        /// Input scene snapshot (JSON)
        input: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Model {
            input,
            output,
            settings,
        } => {
            let settings = settings.resolve()?;
            let output = output.unwrap_or_else(|| default_output(&input));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert_snapshot(&input, &output, &settings)?;
            tracing::info!("Done!");
        }

        Commands::Check { input, settings } => {
            let settings = settings.resolve()?;
            tracing::info!("Checking {:?}", input);
            let scene = SceneSnapshot::load(&input)?;
            let model = convert_to_model(&scene.mesh, &scene.armature, &settings)?;
            println!(
                "{}: {} bones, {} vertices, {} triangles, {} UV channels",
                model.name(),
                model.bones().len(),
                model.vertices().len(),
                model.triangles().len(),
                model.uv_channel_count()
            );
        }
    }

    Ok(())
}

/// `scene.json` -> `scene.model.json`
fn default_output(input: &Path) -> PathBuf {
    input.with_extension("model.json")
}
