use clap::{Parser, Subcommand};
use pixelflow::action::{Action, BitWiseAction, BlurAction};
use pixelflow::cache::DEFAULT_PREVIEW_SIZE;
use pixelflow::imaging::RustBackend;
use pixelflow::{batch, config, inputs, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixelflow")]
#[command(about = "Run images through a configurable chain of filters")]
#[command(long_about = "\
Run images through a configurable chain of filters

A pipeline is a TOML file listing actions in order. Each action receives the
previous action's output; a failing action passes its input through unchanged
and its error is reported next to the image.

  pipeline.toml
  ├── [preview]           # Preview thumbnail size
  ├── [[actions]] blur    # normal | gaussian | median | bilateral | filter2d
  └── [[actions]] bitwise # and | or | xor (with mask) | not

Inputs may be files or directories; directories are searched recursively
for supported images. Results are written as PNG.

Run 'pixelflow gen-config' to generate a documented pipeline.toml.")]
#[command(version)]
struct Cli {
    /// Increase log detail (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a pipeline to images and write the results
    Run {
        /// Pipeline config (defaults to the stock pipeline)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(long, short, default_value = "out")]
        output: PathBuf,

        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Write preview thumbnails for images
    Preview {
        /// Output directory
        #[arg(long, short, default_value = "previews")]
        output: PathBuf,

        /// Longest preview edge in pixels
        #[arg(long, default_value_t = DEFAULT_PREVIEW_SIZE,
              value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,

        /// Image files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Show the parameters each action accepts
    Params {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock pipeline.toml with all options documented
    GenConfig,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run {
            config: config_path,
            output: output_dir,
            inputs: args,
        } => {
            let (pipeline_config, base_dir) = match &config_path {
                Some(path) => (
                    config::load_config(path)?,
                    path.parent().unwrap_or(Path::new(".")).to_path_buf(),
                ),
                None => (config::parse_config(config::stock_config_toml())?, PathBuf::from(".")),
            };
            let backend = RustBackend::new();
            let mut pipeline = config::build_pipeline(&pipeline_config, &base_dir, &backend)?;
            let images = inputs::collect_images(&args);
            std::fs::create_dir_all(&output_dir)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_run_event(&event);
                }
            });
            let summary = batch::run_pipeline(
                &backend,
                &mut pipeline,
                &images,
                &output_dir,
                pipeline_config.preview.size,
                Some(tx),
            );
            printer.join().map_err(|_| "output printer panicked")?;
            output::print_summary(&summary);
        }
        Command::Preview {
            output: output_dir,
            size,
            inputs: args,
        } => {
            let backend = RustBackend::new();
            let images = inputs::collect_images(&args);
            std::fs::create_dir_all(&output_dir)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_run_event(&event);
                }
            });
            let summary = batch::write_previews(&backend, &images, &output_dir, size, Some(tx));
            printer.join().map_err(|_| "output printer panicked")?;
            output::print_summary(&summary);
        }
        Command::Params { json } => {
            let blur = BlurAction::new();
            let bitwise = BitWiseAction::new();
            let actions: [&dyn Action; 2] = [&blur, &bitwise];
            if json {
                println!("{}", serde_json::to_string_pretty(&output::params_json(&actions))?);
            } else {
                output::print_params(&actions);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
