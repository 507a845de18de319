use crate::domain::model::Record;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// The WooCommerce COGS plugin stores the order's total cost of goods as a
/// `meta_data` entry under this key.
const COG_META_KEY: &str = "_wc_cog_order_total_cost";

/// Transaction-fee schedule: percentage per payment method, plus the set of
/// methods that charge a flat $0.30 on top (Shopify's own gateways).
#[derive(Debug, Clone, Default)]
pub struct FeeSchedule {
    rates: HashMap<String, f64>,
    flat_surcharge: HashSet<String>,
}

impl FeeSchedule {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self {
            rates,
            flat_surcharge: HashSet::new(),
        }
    }

    pub fn with_flat_surcharge(mut self, methods: impl IntoIterator<Item = String>) -> Self {
        self.flat_surcharge = methods.into_iter().collect();
        self
    }

    /// `round(total * rate% , 2)`, with the flat surcharge applied before
    /// rounding. Unknown payment methods cost nothing.
    pub fn transaction_cost(&self, total: f64, payment_method: Option<&str>) -> f64 {
        let rate = payment_method
            .and_then(|m| self.rates.get(m))
            .copied()
            .unwrap_or(0.0)
            / 100.0;
        let mut cost = total * rate;
        if payment_method.is_some_and(|m| self.flat_surcharge.contains(m)) {
            cost += 0.30;
        }
        (cost * 100.0).round() / 100.0
    }
}

/// The order's total cost of goods, verbatim from its COGS metadata entry.
pub fn order_total_cogs(record: &Record) -> Option<String> {
    let entries = record.field("meta_data")?.as_array()?;
    entries.iter().find_map(|entry| {
        if entry.get("key")?.as_str()? == COG_META_KEY {
            Some(cell_text(entry.get("value")?))
        } else {
            None
        }
    })
}

/// Sum of the absolute refund totals on the order. Refund totals come back
/// negative from the API; the summary reports them as positive amounts.
pub fn total_refunds(record: &Record) -> f64 {
    let Some(refunds) = record.field("refunds").and_then(Value::as_array) else {
        return 0.0;
    };
    refunds
        .iter()
        .map(|refund| {
            refund
                .get("total")
                .map(number_like)
                .unwrap_or(0.0)
                .abs()
        })
        .sum()
}

/// Monetary fields arrive as strings from WooCommerce and as numbers from
/// other vendors; accept both.
pub fn number_like(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
