//! End-of-scan summary
//!
//! Orders matches by their normalized price so the cheapest listing is easy
//! to spot. Works from the in-memory store or from a snapshot on disk.

use crate::output::store::{detail_url, SnapshotRecord};
use crate::scanner::Item;
use serde_json::Value;
use std::cmp::Ordering;

/// One summarized match
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub name: String,
    pub id: String,
    pub price_label: String,

    /// `showPrice` as a number, if it holds one
    pub price: Option<f64>,

    pub url: String,
}

/// Matches sorted by price, cheapest first, unpriced last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    pub entries: Vec<SummaryEntry>,
}

impl ScanSummary {
    pub fn from_items(items: &[Item], detail_base_url: &str) -> Self {
        let entries = items
            .iter()
            .map(|item| SummaryEntry {
                name: item.name.clone(),
                id: id_label(&item.id),
                price_label: item.price_label(),
                price: item.price_value(),
                url: detail_url(detail_base_url, &item.id),
            })
            .collect();
        Self::sorted(entries)
    }

    pub fn from_records(records: &[SnapshotRecord]) -> Self {
        let entries = records
            .iter()
            .map(|record| {
                let item = Item::new(record.id.clone(), record.name.clone(), record.show_price.clone());
                SummaryEntry {
                    name: record.name.clone(),
                    id: id_label(&record.id),
                    price_label: item.price_label(),
                    price: item.price_value(),
                    url: record.url.clone(),
                }
            })
            .collect();
        Self::sorted(entries)
    }

    fn sorted(mut entries: Vec<SummaryEntry>) -> Self {
        // Stable, so equal prices keep discovery order
        entries.sort_by(|a, b| match (a.price, b.price) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The cheapest priced match
    pub fn cheapest(&self) -> Option<&SummaryEntry> {
        self.entries.first().filter(|entry| entry.price.is_some())
    }
}

fn id_label(id: &Value) -> String {
    match id {
        Value::Null => "N/A".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Prints a summary to stdout
pub fn print_summary(summary: &ScanSummary) {
    if summary.is_empty() {
        println!("No matching items found");
        return;
    }

    println!("\n=== Scan Summary ===");
    println!("Matched items: {}\n", summary.len());

    for entry in &summary.entries {
        println!("- {} (ID: {}) - price: {}", entry.name, entry.id, entry.price_label);
        println!("  {}", entry.url);
    }

    if let Some(cheapest) = summary.cheapest() {
        println!(
            "\nCheapest: {} - price: {}",
            cheapest.name, cheapest.price_label
        );
    }
}
