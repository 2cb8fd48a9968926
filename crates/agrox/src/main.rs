use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;

mod commands;

/// Standardized exit codes for CLI.
/// 0 = OK, 2 = input rejected (locally or by the service), 3 = service unavailable or failing, 1 = other.
#[allow(dead_code)]
const EXIT_OK: i32 = 0;
const EXIT_OTHER: i32 = 1;
const EXIT_INPUT: i32 = 2;
const EXIT_UNAVAILABLE: i32 = 3;

#[derive(Parser)]
#[command(name = "agrox", version, about = "Agro CLI — crop, fertilizer, disease and yield predictions")]
struct Cli {
    /// Inference service URL (default: http://localhost:5000)
    #[arg(long, global = true, env = agro_config::API_URL_ENV)]
    api: Option<String>,

    /// Print the decoded response as JSON instead of a report
    #[arg(long, global = true)]
    json: bool,

    /// Log requests and failures to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a crop for the given soil and climate
    Crop {
        #[arg(long, short = 'N')]
        nitrogen: Option<String>,
        #[arg(long, short = 'P')]
        phosphorus: Option<String>,
        #[arg(long, short = 'K')]
        potassium: Option<String>,
        /// Temperature in °C
        #[arg(long)]
        temperature: Option<String>,
        /// Relative humidity in %
        #[arg(long)]
        humidity: Option<String>,
        #[arg(long)]
        ph: Option<String>,
        /// Rainfall in mm
        #[arg(long)]
        rainfall: Option<String>,
    },
    /// Recommend fertilizer for a crop given current soil nutrients
    Fertilizer {
        /// Crop name (see `agrox crops`)
        #[arg(long)]
        crop: Option<String>,
        #[arg(long, short = 'N')]
        nitrogen: Option<String>,
        #[arg(long, short = 'P')]
        phosphorus: Option<String>,
        #[arg(long, short = 'K')]
        potassium: Option<String>,
    },
    /// Classify a plant leaf image
    Disease {
        /// Path to a leaf image (jpg, png, gif, bmp, webp, tiff)
        image: PathBuf,
    },
    /// Predict crop yield
    Yield {
        #[arg(long)]
        year: Option<String>,
        /// Average rainfall in mm per year
        #[arg(long)]
        rainfall: Option<String>,
        /// Pesticides in tonnes
        #[arg(long)]
        pesticides: Option<String>,
        /// Average temperature in °C
        #[arg(long)]
        temperature: Option<String>,
        /// Country or region
        #[arg(long)]
        area: Option<String>,
        /// Crop item, e.g. Maize
        #[arg(long)]
        crop: Option<String>,
    },
    /// List crops accepted by the fertilizer form
    Crops,
    /// Check service health
    Health,
    /// Show service name, version and endpoints
    Info,
}

/// Map a failure message to an exit code.
fn exit_code_for(err: &str) -> i32 {
    if err.starts_with("Missing required field")
        || err.starts_with("Invalid input data")
        || err.starts_with("Unknown crop")
        || err.starts_with("No file uploaded")
        || err.starts_with("read ")
        || err.starts_with("not an image")
        || err.starts_with("unknown field")
    {
        EXIT_INPUT
    } else if err.ends_with("Please try again.")
        || err.starts_with("HTTP 5")
        || err == agro_adapter::TRANSPORT_MESSAGE
    {
        EXIT_UNAVAILABLE
    } else {
        EXIT_OTHER
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }

    let client = commands::Client::new(cli.api.as_deref(), cli.json);

    let result = match cli.command {
        Commands::Crop { nitrogen, phosphorus, potassium, temperature, humidity, ph, rainfall } => {
            commands::crop(
                &client,
                &[
                    ("nitrogen", nitrogen),
                    ("phosphorus", phosphorus),
                    ("potassium", potassium),
                    ("temperature", temperature),
                    ("humidity", humidity),
                    ("ph", ph),
                    ("rainfall", rainfall),
                ],
            )
            .await
        }
        Commands::Fertilizer { crop, nitrogen, phosphorus, potassium } => {
            commands::fertilizer(
                &client,
                &[
                    ("crop", crop),
                    ("nitrogen", nitrogen),
                    ("phosphorus", phosphorus),
                    ("potassium", potassium),
                ],
            )
            .await
        }
        Commands::Disease { image } => commands::disease(&client, &image).await,
        Commands::Yield { year, rainfall, pesticides, temperature, area, crop } => {
            commands::yield_prediction(
                &client,
                &[
                    ("year", year),
                    ("rainfall", rainfall),
                    ("pesticides", pesticides),
                    ("temperature", temperature),
                    ("area", area),
                    ("crop", crop),
                ],
            )
            .await
        }
        Commands::Crops => commands::crops(),
        Commands::Health => commands::health(&client).await,
        Commands::Info => commands::info(&client).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(exit_code_for(&e));
    }
}
