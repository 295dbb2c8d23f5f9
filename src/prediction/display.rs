//! Plain-text presentation of a prediction.

use super::response::{Estimates, PredictionResult};
use crate::core::constants::VND_PER_BILLION;
use std::fmt::Write;

/// Formats a price given in billions of VND as a full VND amount, grouped
/// the Vietnamese way: `2.5` -> `2.500.000.000 ₫`.
pub fn format_vnd(billions: f64) -> String {
    let total = (billions * VND_PER_BILLION).round();
    let digits = format!("{:.0}", total.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if total < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} ₫")
}

/// Model price with three decimals
pub fn format_price(price: f64) -> String {
    format!("{:.3}", price)
}

pub fn format_distance(distance_km: Option<f64>) -> String {
    format!("{:.2} km", distance_km.unwrap_or(0.0))
}

/// Renders the input summary, each model's estimate and, for comparisons,
/// the gap between the models.
pub fn render(result: &PredictionResult) -> String {
    let mut out = String::new();
    let input = &result.input;
    let unit = &result.unit;

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Your Input Summary");
    let _ = writeln!(out, "  Area: {} m²", input.area);
    let _ = writeln!(out, "  Bedrooms: {}", input.bedrooms);
    let _ = writeln!(out, "  Bathrooms: {}", input.bathrooms);
    let _ = writeln!(out, "  District: {}", result.district());
    let _ = writeln!(
        out,
        "  Distance from center: {}",
        format_distance(result.distance_km)
    );

    for (index, estimate) in result.estimates.models().iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}", index + 1, estimate.model);
        let _ = writeln!(
            out,
            "  Price (Billions {}): {}",
            unit,
            format_price(estimate.price)
        );
        let _ = writeln!(out, "  Total Price: {}", format_vnd(estimate.price));
    }

    if let Estimates::Comparison {
        xgboost,
        deep_learning,
    } = result.estimates
    {
        let _ = writeln!(out);
        let _ = writeln!(out, "Quick Comparison");
        let _ = writeln!(out, "  XGBoost predicts: {} {}", format_price(xgboost), unit);
        let _ = writeln!(
            out,
            "  Neural Network predicts: {} {}",
            format_price(deep_learning),
            unit
        );
        let _ = writeln!(
            out,
            "  Difference: {} {}",
            format_price((xgboost - deep_learning).abs()),
            unit
        );
    }

    out
}
