//! Weft CLI: run, bake and check cloth scenes.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about = "Weft: team-indexed cloth simulation driver")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every cloth in a scene and run it for the configured duration.
    Simulate {
        /// Path to the scene description (JSON or TOML).
        #[arg(short, long, default_value = "scene.toml")]
        scene: String,

        /// Override the number of ticks.
        #[arg(short, long)]
        ticks: Option<u32>,

        /// Write a JSON run summary to this path.
        #[arg(short, long)]
        output: Option<String>,

        /// Forward simulation events to the log.
        #[arg(long)]
        events: bool,
    },

    /// Bake a cloth's construction into a pre-built blob.
    Prebuild {
        /// Path to the scene description.
        #[arg(short, long)]
        scene: String,

        /// Name of the cloth to bake.
        #[arg(short, long)]
        cloth: String,

        /// Output blob path.
        #[arg(short, long)]
        output: String,
    },

    /// Inspect a pre-built blob.
    Inspect {
        /// Path to the blob file.
        path: String,
    },

    /// Validate a scene description.
    Validate {
        /// Path to the scene description.
        path: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Simulate {
            scene,
            ticks,
            output,
            events,
        } => commands::simulate(&scene, ticks, output.as_deref(), events),
        Commands::Prebuild {
            scene,
            cloth,
            output,
        } => commands::prebuild(&scene, &cloth, &output),
        Commands::Inspect { path } => commands::inspect(&path),
        Commands::Validate { path } => commands::validate(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
