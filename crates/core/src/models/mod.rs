//! Shared domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seller shown alongside a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    /// Seller identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Average rating in `[0, 5]`.
    pub rating: f32,
}

/// A second-hand listing offered for negotiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Listing identifier.
    pub id: String,
    /// Listing title.
    pub title: String,
    /// Free-form description written by the seller.
    #[serde(default)]
    pub description: String,
    /// Link to the listing photo.
    #[serde(default)]
    pub image_url: String,
    /// Category label used by the browse filter.
    #[serde(default)]
    pub category: String,
    /// Who is selling.
    pub seller: Seller,
    /// Asking price in the smallest currency unit.
    pub initial_price: u64,
    /// Highest bid recorded elsewhere, display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_bid: Option<u64>,
    /// Whether the listing is currently marked as an active auction.
    #[serde(default)]
    pub is_auction_active: bool,
    /// When the auction closes, if it has an end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auction_end_time: Option<DateTime<Utc>>,
    /// Where the item can be picked up.
    #[serde(default)]
    pub location: String,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Price shown on the listing card: the current bid when one exists.
    pub fn listed_price(&self) -> u64 {
        self.current_bid.unwrap_or(self.initial_price)
    }

    /// Relative age of the listing, e.g. `5h ago`.
    pub fn listed_ago(&self, now: DateTime<Utc>) -> String {
        let hours = (now - self.created_at).num_hours();
        let days = hours / 24;
        if days > 0 {
            format!("{days}d ago")
        } else if hours > 0 {
            format!("{hours}h ago")
        } else {
            "just now".to_string()
        }
    }
}

/// Format an amount with thousands separators and the won suffix.
pub fn format_price(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push('원');
    grouped
}
