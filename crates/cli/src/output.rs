//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Pretty-print any response as JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Group digits the Indian way: 1234567 -> "12,34,567"
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Format an amount in whole currency units
pub fn format_price(amount: i64, currency: &str) -> String {
    let grouped = group_indian(&amount.unsigned_abs().to_string());
    let sign = if amount < 0 { "-" } else { "" };
    match currency {
        "INR" => format!("{}₹{}", sign, grouped),
        _ => format!("{}{} {}", sign, grouped, currency),
    }
}

/// Signed contribution, e.g. "+15,000" or "-30,000"
pub fn format_delta(amount: i64) -> String {
    let grouped = group_indian(&amount.unsigned_abs().to_string());
    if amount < 0 {
        format!("-{}", grouped).red().to_string()
    } else {
        format!("+{}", grouped).green().to_string()
    }
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" | "error" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Highlight which estimator served a prediction
pub fn color_model(model_used: &str) -> String {
    match model_used {
        "ml_model" => "ML model".cyan().to_string(),
        "heuristic" => "heuristic".yellow().to_string(),
        other => other.to_string(),
    }
}

/// Human-readable name for a breakdown key ("ageAdjustment" -> "Age adjustment")
pub fn contribution_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (idx, ch) in key.chars().enumerate() {
        if idx == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.extend(ch.to_lowercase());
        } else {
            label.push(ch);
        }
    }
    label
}

pub fn format_timestamp(ts: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indian_grouping() {
        assert_eq!(format_price(0, "INR"), "₹0");
        assert_eq!(format_price(999, "INR"), "₹999");
        assert_eq!(format_price(387_500, "INR"), "₹3,87,500");
        assert_eq!(format_price(12_345_678, "INR"), "₹1,23,45,678");
        assert_eq!(format_price(-20_000, "INR"), "-₹20,000");
        assert_eq!(format_price(1_500, "USD"), "1,500 USD");
    }

    #[test]
    fn test_contribution_label() {
        assert_eq!(contribution_label("ageAdjustment"), "Age adjustment");
        assert_eq!(
            contribution_label("otherAmenitiesContribution"),
            "Other amenities contribution"
        );
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.85), "85%");
        assert_eq!(format_confidence(0.9), "90%");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2025-03-01T10:20:30.123Z"),
            "2025-03-01 10:20:30"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }
}
