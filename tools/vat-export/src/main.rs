//! vat-export - vertex animation texture baker
//!
//! Bakes skinned glTF animation clips into VAT artifacts
//! (.png/.vattex, .vatmesh, .vat.json)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use vat_common::VatAnimation;
use vat_export::{
    BakeRequest, CancelToken, DEFAULT_SAMPLE_RATE, GltfSource, OutputLock, TextureEncoding, manifest,
};

#[derive(Parser)]
#[command(name = "vat-export")]
#[command(about = "Vertex animation texture baker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake one animation clip from a glTF/GLB file
    Bake {
        /// Input glTF/GLB file with a skinned mesh
        input: PathBuf,

        /// Animation name (default: first animation)
        #[arg(short, long)]
        animation: Option<String>,

        /// Frame rate for sampling
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        frame_rate: f32,

        /// Output directory (default: next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output name (default: input file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Texture encoding (png16 or f16)
        #[arg(short, long, default_value_t = TextureEncoding::Png16)]
        encoding: TextureEncoding,

        /// Skinned mesh node name (default: first skinned mesh)
        #[arg(short, long)]
        mesh: Option<String>,
    },

    /// Bake everything listed in a manifest file
    Build {
        /// Path to vat.toml manifest
        #[arg(default_value = "vat.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate manifest without baking
    Check {
        /// Path to vat.toml manifest
        #[arg(default_value = "vat.toml")]
        manifest: PathBuf,
    },

    /// List animations and skinned meshes in a glTF/GLB file
    List {
        /// Input glTF/GLB file
        input: PathBuf,
    },

    /// Load a bake from its .vat.json sidecar and report it
    Inspect {
        /// Path to <name>.vat.json
        metadata: PathBuf,
    },

    /// Preview the crowd described in a manifest
    Crowd {
        /// Path to vat.toml manifest
        #[arg(default_value = "vat.toml")]
        manifest: PathBuf,

        /// Seed for a reproducible crowd (overrides manifest)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Instance count (overrides manifest)
        #[arg(short, long)]
        count: Option<i64>,
    },
}

/// Cancel `token` on the first Ctrl-C so the running bake unwinds and
/// releases its output lock. A second Ctrl-C exits immediately.
fn cancel_on_ctrl_c(token: CancelToken) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Ctrl-C handling unavailable: {}", e);
                return;
            }
        };
        runtime.block_on(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Ctrl-C handling unavailable: {}", e);
                return;
            }
            tracing::warn!("Interrupted, cancelling bake (Ctrl-C again to abort)");
            token.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(130);
            }
        });
    });
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
    let cancel = CancelToken::new();

    match cli.command {
        Commands::Bake {
            input,
            animation,
            frame_rate,
            output,
            name,
            encoding,
            mesh,
        } => {
            let name = match name {
                Some(name) => name,
                None => input
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("Cannot derive an output name from {:?}", input))?,
            };
            let output_dir = output.unwrap_or_else(|| {
                input
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            });
            tracing::info!("Baking {:?} -> {:?} ({})", input, output_dir, name);

            cancel_on_ctrl_c(cancel.clone());
            let lock = OutputLock::acquire(&output_dir, &name)?;
            let source = GltfSource::open(&input)?;
            let mesh = source.skinned_mesh(mesh.as_deref())?;
            let clip = source.clip(animation.as_deref())?;
            let baked = BakeRequest::new()
                .mesh(&mesh)
                .clip(&clip)
                .sample_rate(frame_rate)
                .cancel_token(cancel)
                .run()?;
            lock.write(&baked, encoding)?;
            tracing::info!("Done!");
        }

        Commands::Build {
            manifest,
            output,
            verbose,
        } => {
            if verbose {
                tracing::info!("Building VATs from {:?}", manifest);
            }
            let config = manifest::load_manifest(&manifest)?;
            cancel_on_ctrl_c(cancel.clone());
            let written = manifest::build_all(&config, output.as_deref(), &cancel)?;
            tracing::info!("Build complete! {} bakes written", written.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            manifest::validate(&config)?;
            tracing::info!("Manifest is valid!");
        }

        Commands::List { input } => {
            let source = GltfSource::open(&input)?;

            let clips = source.clips()?;
            if clips.is_empty() {
                tracing::info!("No animations found in {:?}", input);
            } else {
                tracing::info!("Animations in {:?}:", input);
                for clip in clips {
                    tracing::info!(
                        "  [{}] '{}': {} channels, {:.2}s",
                        clip.index,
                        clip.name,
                        clip.channels,
                        clip.length
                    );
                }
            }

            let meshes = source.skinned_meshes();
            if meshes.is_empty() {
                tracing::info!("No skinned meshes found in {:?}", input);
            } else {
                tracing::info!("Skinned meshes in {:?}:", input);
                for mesh in meshes {
                    tracing::info!(
                        "  [node {}] '{}': {} vertices, {} joints",
                        mesh.node,
                        mesh.name,
                        mesh.vertex_count,
                        mesh.joint_count
                    );
                }
            }
        }

        Commands::Inspect { metadata } => {
            let anim = VatAnimation::load(&metadata)
                .with_context(|| format!("Failed to load VAT: {:?}", metadata))?;
            let mesh = VatAnimation::load_mesh(&metadata, anim.metadata())
                .with_context(|| format!("Failed to load mesh for {:?}", metadata))?;
            let info = anim.metadata();
            tracing::info!(
                "'{}' (clip '{}'): {} vertices x {} frames at {} fps ({:.2}s), {} encoding",
                info.name,
                info.clip,
                info.vertex_count,
                info.frame_count,
                info.sample_rate,
                info.baked_duration(),
                info.encoding
            );
            tracing::info!("  bounds min {:?} max {:?}", info.bounds.min, info.bounds.max);
            tracing::info!(
                "  mesh: {} vertices, {} triangles",
                mesh.vertex_count(),
                mesh.indices.len() / 3
            );
        }

        Commands::Crowd {
            manifest,
            seed,
            count,
        } => {
            let config = manifest::load_manifest(&manifest)?;
            let mut crowd = config
                .crowd
                .with_context(|| format!("No [crowd] section in {:?}", manifest))?;
            if let Some(seed) = seed {
                crowd.seed = Some(seed);
            }
            if let Some(count) = count {
                crowd.instance_count = count;
            }

            let state = vat_crowd::initialize(&crowd)?;
            tracing::info!(
                "Crowd: {} instances in {} batches of up to {} (seed {:?})",
                state.instance_count(),
                state.batches().len(),
                state.batch_size(),
                state.seed()
            );
            for (i, batch) in state.batches().iter().enumerate() {
                tracing::info!("  batch {}: {} instances", i, batch.len());
            }
        }
    }

    Ok(())
}
