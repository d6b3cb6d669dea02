//! bp3d-export - BlockProject 3D export tool
//!
//! Converts objects of a scene dump (JSON) into BlockProject 3D text files
//! (.bp3d.obj, .armature.bp3d.obj, .animation.bp3d.obj)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bp3d_export::{
    export, manifest, report, ExportOptions, FrameRange, KeyPrecision, PoseEvaluator, MAX_DECIMALS,
};
use bp3d_shared::{Scene, BP3D_FORMAT};

#[derive(Parser)]
#[command(name = "bp3d-export")]
#[command(about = "BlockProject 3D export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one object (and its children) from a scene dump
    Export {
        /// Input scene dump (JSON)
        scene: PathBuf,

        /// Root object to export
        #[arg(long)]
        object: String,

        /// Output .bp3d.obj file (default: <object>.bp3d.obj next to the scene)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// First animation frame (default: scene start)
        #[arg(long)]
        frame_start: Option<i32>,

        /// Last animation frame (default: scene end)
        #[arg(long)]
        frame_end: Option<i32>,

        /// Round normals and UVs to this many decimals before deduplicating
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=MAX_DECIMALS as i64))]
        precision: Option<u8>,

        /// Omit section comments
        #[arg(long)]
        no_comments: bool,
    },

    /// Build exports from a manifest file
    Build {
        /// Path to bp3d.toml manifest
        #[arg(default_value = "bp3d.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without building
    Check {
        /// Path to bp3d.toml manifest
        #[arg(default_value = "bp3d.toml")]
        manifest: PathBuf,
    },

    /// Read back an exported file and its companions
    Inspect {
        /// Main .bp3d.obj file
        input: PathBuf,
    },

    /// List the objects of a scene dump
    List {
        /// Input scene dump (JSON)
        scene: PathBuf,
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
        Commands::Export {
            scene,
            object,
            output,
            frame_start,
            frame_end,
            precision,
            no_comments,
        } => {
            let scene_path = scene;
            let mut scene = Scene::load(&scene_path)
                .with_context(|| format!("Failed to load scene: {:?}", scene_path))?;
            let root = scene
                .object_id(&object)
                .with_context(|| format!("Object '{}' not found in {:?}", object, scene_path))?;

            let output = output.unwrap_or_else(|| {
                let dir = scene_path.parent().map(PathBuf::from).unwrap_or_default();
                BP3D_FORMAT.object_path(&dir, &object)
            });

            let scene_range = scene.frame_range();
            let options = ExportOptions {
                frame_range: Some(FrameRange::new(
                    frame_start.unwrap_or(scene_range.start),
                    frame_end.unwrap_or(scene_range.end),
                )),
                precision: precision
                    .map(|decimals| KeyPrecision::Quantized { decimals })
                    .unwrap_or_default(),
                section_comments: !no_comments,
            };

            tracing::info!("Exporting '{}' -> {:?}", object, output);
            export(&mut scene, root, &output, &options)
                .with_context(|| format!("Failed to export '{}'", object))?;
            tracing::info!("Done!");
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building exports from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            let summaries = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} export(s)", summaries.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Inspect { input } => {
            report::inspect(&input)?;
        }

        Commands::List { scene } => {
            report::list_scene(&scene)?;
        }
    }

    Ok(())
}
