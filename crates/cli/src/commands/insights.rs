//! Market trends, predictor health and model management commands

use anyhow::Result;
use colored::Colorize;
use std::collections::BTreeMap;
use tabled::{settings::Style, Table, Tabled};

use crate::client::{ApiClient, MarketTrendsResponse, PredictorHealth, ReloadResponse};
use crate::output::{
    color_status, format_delta, format_price, format_timestamp, print_info, print_json,
    print_success, print_warning, OutputFormat,
};

/// Row for the coefficient tables
#[derive(Tabled)]
struct FactorRow {
    #[tabled(rename = "Factor")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn factor_rows(table: &BTreeMap<String, i64>) -> Vec<FactorRow> {
    // Largest premium first
    let mut entries: Vec<_> = table.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .map(|(name, value)| FactorRow {
            name: name.clone(),
            value: format_delta(*value),
        })
        .collect()
}

fn print_factor_table(title: &str, table: &BTreeMap<String, i64>) {
    println!("{}", title.bold());
    println!(
        "{}",
        Table::new(factor_rows(table)).with(Style::rounded())
    );
    println!();
}

pub async fn show_trends(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: MarketTrendsResponse = client.get("predictor/market-trends").await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            let trends = &response.trends;
            println!("{}", "Market Trends".bold());
            println!("{}", "=".repeat(50));
            println!(
                "Average price per sq ft: {}",
                format_price(trends.average_price_per_sq_ft.round() as i64, "INR").green()
            );
            println!();

            print_factor_table("Location Premiums", &trends.location_premiums);
            print_factor_table("Condition Adjustments", &trends.condition_adjustments);
            print_factor_table("Amenity Values", &trends.amenity_values);

            if !response.message.is_empty() {
                println!("{}", response.message.dimmed());
            }
            println!(
                "Last updated: {}",
                format_timestamp(&response.last_updated).dimmed()
            );
        }
    }

    Ok(())
}

pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: PredictorHealth = client.get("predictor/health").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{}", "Predictor Health".bold());
            println!("{}", "=".repeat(50));
            println!("Status:                 {}", color_status(&health.status));
            println!(
                "ML model loaded:        {}",
                if health.ml_model_loaded {
                    "yes".green()
                } else {
                    "no".yellow()
                }
            );
            println!(
                "Model path:             {}",
                health.model_path.as_deref().unwrap_or("-")
            );
            println!();
            if health.ml_model_loaded {
                print_info(&health.message);
            } else {
                print_warning(&health.message);
            }
        }
    }

    Ok(())
}

/// Ask the service to re-read its model artifacts
pub async fn reload_model(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let response: ReloadResponse = client
        .post("predictor/reload", &serde_json::json!({}))
        .await?;

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            if response.ml_model_loaded {
                print_success(&format!(
                    "{} (version {})",
                    response.message,
                    response.model_version.as_deref().unwrap_or("unknown")
                ));
            } else {
                print_warning(&response.message);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_rows_sorted_by_value() {
        let mut table = BTreeMap::new();
        table.insert("rural".to_string(), 10_000);
        table.insert("urban".to_string(), 50_000);
        table.insert("suburban".to_string(), 30_000);

        let names: Vec<_> = factor_rows(&table).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["urban", "suburban", "rural"]);
    }
}
