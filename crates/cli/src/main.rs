//! Property Price Prediction CLI
//!
//! A command-line tool for requesting price estimates, running batch
//! predictions and inspecting the prediction service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{batch, insights, predict};
use std::path::PathBuf;

/// Property Price Prediction CLI
#[derive(Parser)]
#[command(name = "pricectl")]
#[command(author, version, about = "CLI for the property price prediction service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via PRICECTL_API_URL env var)
    #[arg(long, env = "PRICECTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the price of a single property
    Predict {
        /// Built-up area in square feet
        #[arg(long)]
        area: f64,

        /// Number of bedrooms
        #[arg(long)]
        bedrooms: i64,

        /// Number of bathrooms
        #[arg(long)]
        bathrooms: i64,

        /// Number of floors
        #[arg(long)]
        floors: Option<i64>,

        /// Construction year
        #[arg(long, required_unless_present = "age", conflicts_with = "age")]
        year_built: Option<i32>,

        /// Age of the building in years
        #[arg(long)]
        age: Option<i32>,

        /// Location category (Urban, Suburban, Rural, Downtown)
        #[arg(long)]
        location: Option<String>,

        /// Condition (Excellent, Good, Fair, Poor)
        #[arg(long)]
        condition: Option<String>,

        /// Property has a garage
        #[arg(long)]
        garage: bool,

        /// Amenity, may be repeated (e.g. --amenity pool --amenity gym)
        #[arg(long = "amenity")]
        amenities: Vec<String>,
    },

    /// Estimate prices for every property in a JSON file
    Batch {
        /// JSON file with an array of property feature records
        file: PathBuf,
    },

    /// Show the pricing coefficients of the heuristic estimator
    Trends,

    /// Show predictor status
    Health,

    /// Reload the learned model from disk
    Reload,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let api_url = config::Config::load()?.resolve_api_url(cli.api_url.as_deref());
    let client = client::ApiClient::new(&api_url)?;

    match cli.command {
        Commands::Predict {
            area,
            bedrooms,
            bathrooms,
            floors,
            year_built,
            age,
            location,
            condition,
            garage,
            amenities,
        } => {
            let input = client::PropertyInput {
                area,
                bedrooms,
                bathrooms,
                floors,
                year_built,
                age,
                location,
                condition,
                garage: garage.then_some(true),
                amenities,
            };
            predict::predict(&client, input, cli.format).await?;
        }
        Commands::Batch { file } => {
            batch::batch_predict(&client, &file, cli.format).await?;
        }
        Commands::Trends => {
            insights::show_trends(&client, cli.format).await?;
        }
        Commands::Health => {
            insights::show_health(&client, cli.format).await?;
        }
        Commands::Reload => {
            insights::reload_model(&client, cli.format).await?;
        }
    }

    Ok(())
}
