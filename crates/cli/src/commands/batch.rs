//! Batch price prediction from a JSON file

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, BatchPredictionRequest, BatchPredictionResponse};
use crate::output::{
    color_model, format_confidence, format_price, print_json, print_warning, OutputFormat,
};

/// Largest batch the service accepts
const MAX_BATCH_SIZE: usize = 100;

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "#")]
    property_id: usize,
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Estimate")]
    estimate: String,
    #[tabled(rename = "Range")]
    range: String,
    #[tabled(rename = "Confidence")]
    confidence: String,
}

/// Read a JSON array of property feature records
pub fn load_properties(path: &Path) -> Result<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("Batch file is not valid JSON")?;

    match value {
        serde_json::Value::Array(properties) => Ok(properties),
        // Also accept a request body saved as-is
        serde_json::Value::Object(mut body) => match body.remove("properties") {
            Some(serde_json::Value::Array(properties)) => Ok(properties),
            _ => anyhow::bail!("Batch file must contain a JSON array of properties"),
        },
        _ => anyhow::bail!("Batch file must contain a JSON array of properties"),
    }
}

pub async fn batch_predict(client: &ApiClient, path: &Path, format: OutputFormat) -> Result<()> {
    let properties = load_properties(path)?;
    if properties.is_empty() {
        anyhow::bail!("Batch file contains no properties");
    }
    if properties.len() > MAX_BATCH_SIZE {
        print_warning(&format!(
            "{} properties in file; the service accepts at most {}",
            properties.len(),
            MAX_BATCH_SIZE
        ));
    }

    let request = BatchPredictionRequest { properties };
    let response: BatchPredictionResponse = client.post("predictor/batch-predict", &request).await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => print_batch(&response),
    }

    Ok(())
}

fn field_text(features: &serde_json::Value, key: &str) -> String {
    match features.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn print_batch(response: &BatchPredictionResponse) {
    let rows: Vec<BatchRow> = response
        .predictions
        .iter()
        .map(|p| BatchRow {
            property_id: p.property_id,
            area: field_text(&p.features, "area"),
            location: field_text(&p.features, "location"),
            estimate: format_price(p.prediction.estimated_price, &response.currency),
            range: format!(
                "{} - {}",
                format_price(p.prediction.price_range.min, &response.currency),
                format_price(p.prediction.price_range.max, &response.currency)
            ),
            confidence: format_confidence(p.prediction.confidence),
        })
        .collect();

    println!(
        "{} {} properties priced by {}",
        "Batch Estimate:".bold(),
        rows.len(),
        color_model(&response.model_used)
    );
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    println!("{}", response.disclaimer.dimmed());
}
