//! Plain-text layouts of the reports sent to the sink.

use std::fmt::Display;

use crate::monitoring::types::Target;

fn stock_text(stock: Option<u64>) -> String {
    stock.map_or_else(|| "n/a".to_string(), |s| s.to_string())
}

fn price_text(price: Option<f64>) -> String {
    price.map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}"))
}

/// Report for a target whose stock or price changed
pub fn change_report(
    target: &Target,
    currency: &str,
    (previous_stock, new_stock): (Option<u64>, Option<u64>),
    (previous_price, new_price): (Option<f64>, Option<f64>),
) -> String {
    let price_label =
        if currency.is_empty() { "Price".to_string() } else { format!("Price ({currency})") };

    format!(
        "Stock change alert\nProduct: {}\nStock: {} -> {}\n{}: {} -> {}\nLink: {}",
        target.display_name,
        stock_text(previous_stock),
        stock_text(new_stock),
        price_label,
        price_text(previous_price),
        price_text(new_price),
        target.identity,
    )
}

/// Report for an unexpected failure scoped to one target
pub fn target_error_report(target: &Target, error: &dyn Display) -> String {
    format!("{} check failed:\n{}\nLink: {}", target.display_name, error, target.identity)
}

/// Report for a failure that aborted a whole cycle
pub fn cycle_error_report(error: &dyn Display) -> String {
    format!("Monitoring cycle failed:\n{error}")
}
