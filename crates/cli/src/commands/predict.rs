//! Single-property price prediction

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, PredictionRequest, PredictionResponse, PropertyInput};
use crate::output::{
    color_model, contribution_label, format_confidence, format_delta, format_price,
    format_timestamp, print_json, OutputFormat,
};

/// Row for the price breakdown table
#[derive(Tabled)]
struct BreakdownRow {
    #[tabled(rename = "Factor")]
    factor: String,
    #[tabled(rename = "Contribution")]
    contribution: String,
}

fn breakdown_rows(breakdown: &BTreeMap<String, i64>) -> Vec<BreakdownRow> {
    breakdown
        .iter()
        .map(|(key, value)| BreakdownRow {
            factor: contribution_label(key),
            contribution: format_delta(*value),
        })
        .collect()
}

/// Request a price estimate for one property
pub async fn predict(client: &ApiClient, input: PropertyInput, format: OutputFormat) -> Result<()> {
    let request = PredictionRequest { features: input };
    let response: PredictionResponse = client.post("predictor/predict", &request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_prediction(&response),
    }

    Ok(())
}

fn print_prediction(response: &PredictionResponse) {
    let result = &response.prediction;

    println!("{}", "Price Estimate".bold());
    println!("{}", "=".repeat(50));
    println!(
        "Estimated price:        {}",
        format_price(result.estimated_price, &response.currency).green().bold()
    );
    println!(
        "Range:                  {} - {}",
        format_price(result.price_range.min, &response.currency),
        format_price(result.price_range.max, &response.currency)
    );
    println!("Confidence:             {}", format_confidence(result.confidence));
    println!("Model:                  {}", color_model(&response.model_used));

    if !result.breakdown.is_empty() {
        println!();
        println!("{}", "Breakdown".bold());
        let table = Table::new(breakdown_rows(&result.breakdown))
            .with(Style::rounded())
            .to_string();
        println!("{}", table);
    }

    println!();
    println!("{}", response.disclaimer.dimmed());
    println!("Generated: {}", format_timestamp(&response.timestamp).dimmed());
}
