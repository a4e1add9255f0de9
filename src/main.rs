use clap::{Parser, Subcommand};
use poster_portrait::imaging::{SidecarModels, render_background};
use poster_portrait::pipeline::Pipeline;
use poster_portrait::{config, output};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "poster-portrait")]
#[command(about = "Turn a portrait photo into a two-tone mosaic propaganda poster")]
#[command(long_about = "\
Turn a portrait photo into a two-tone mosaic propaganda poster

The face is cut out of the photo, reduced to a red and skin-tone mosaic,
placed on a red sunburst background and captioned with the subject's name.

Segmentation comes from an external tool as a sidecar file. Faces come
from a second sidecar or are detected in-process with a SeetaFace model:

  --mask        grayscale matte, white = subject (resized to the photo if needed)
  --landmarks   JSON: {\"faces\": [{\"confidence\": 0.98,
                                  \"landmarks\": [{\"x\": 0.41, \"y\": 0.22}, ...]}]}
                coordinates normalized to 0-1
  --face-model  seeta_fd_frontal_v1.0.bin (or extract.face_model in the config)

Run 'poster-portrait gen-config' to generate a documented config file.
Set RUST_LOG=debug to see what each stage decided.")]
#[command(version)]
struct Cli {
    /// Poster config file (TOML); stock defaults when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Seed for the background generator.
#[derive(clap::Args, Clone)]
struct SeedArgs {
    /// Seed the background rays for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Render a poster from a photo and its model sidecars
    Render {
        /// Portrait photo (JPEG, PNG, TIFF or WebP)
        #[arg(long)]
        input: PathBuf,
        /// Segmentation matte for the photo
        #[arg(long)]
        mask: PathBuf,
        /// Face landmark JSON for the photo
        #[arg(long, conflicts_with = "face_model")]
        landmarks: Option<PathBuf>,
        /// SeetaFace model for in-process face detection (overrides extract.face_model)
        #[arg(long)]
        face_model: Option<PathBuf>,
        /// Name for the caption; no caption when omitted
        #[arg(long)]
        name: Option<String>,
        /// Where to write the poster (PNG)
        #[arg(long, default_value = "poster.png")]
        output: PathBuf,
        #[command(flatten)]
        seed: SeedArgs,
    },
    /// Render only the radial background
    Background {
        /// Width in pixels (defaults to background.width)
        #[arg(long)]
        width: Option<u32>,
        /// Height in pixels (defaults to background.height)
        #[arg(long)]
        height: Option<u32>,
        /// Where to write the background (PNG)
        #[arg(long, default_value = "background.png")]
        output: PathBuf,
        #[command(flatten)]
        seed: SeedArgs,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Render {
            input,
            mask,
            landmarks,
            face_model,
            name,
            output,
            seed,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let photo = image::open(&input)?;
            let models = match (landmarks, face_model.or(config.extract.face_model.clone())) {
                (Some(landmarks), _) => SidecarModels::new(mask, landmarks),
                (None, Some(model)) => SidecarModels::with_face_model(mask, &model)?,
                (None, None) => {
                    return Err(
                        "faces need --landmarks, --face-model or extract.face_model".into(),
                    );
                }
            };
            let mut rng = rng_for(seed.seed);

            let poster = Pipeline::new(&config, &models).render(&photo, name.as_deref(), &mut rng)?;
            poster.image.save(&output)?;
            output::print_render_report(&poster.report, &output);
        }
        Command::Background {
            width,
            height,
            output,
            seed,
        } => {
            let config = config::load_config(cli.config.as_deref())?;
            let size = (
                width.unwrap_or(config.background.width),
                height.unwrap_or(config.background.height),
            );
            if size.0 == 0 || size.1 == 0 {
                return Err("background width and height must be non-zero".into());
            }
            let mut rng = rng_for(seed.seed);
            let background =
                render_background(size.0, size.1, &config.background.style(), &mut rng);
            background.save(&output)?;
            output::print_background_output(size, seed.seed, &output);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr at `info` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Seeded generator when a seed is given, OS entropy otherwise.
fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
