//! Pure projection of a negotiation into what the dialog shows.

use chrono::{DateTime, Local, Utc};
use updown_core::{format_price, Actor, NegotiationSession, Phase};

/// Banner shown above the price controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    /// Waiting on the seller.
    Waiting,
    /// Seller countered; the buyer may accept.
    CounterOffer { price: u64 },
    /// Deal struck.
    Success { final_price: u64 },
    /// Seller declined the last price.
    Stalled { price: u64 },
}

/// One rendered history line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    pub actor: Actor,
    pub label: &'static str,
    pub price: String,
    pub time: String,
}

/// Everything the negotiation dialog needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationView {
    pub current_price: String,
    pub asking_price: String,
    pub floor_price: String,
    pub buttons_enabled: bool,
    pub can_accept: bool,
    pub banner: Option<Banner>,
    pub history: Vec<HistoryLine>,
}

impl NegotiationView {
    pub fn from_session(session: &NegotiationSession) -> Self {
        let banner = match (session.final_price(), session.phase()) {
            (Some(final_price), _) => Some(Banner::Success { final_price }),
            (None, Phase::AwaitingResponse) => Some(Banner::Waiting),
            (None, Phase::CounterOffered) => Some(Banner::CounterOffer {
                price: session.seller_price(),
            }),
            (None, Phase::Rejected) => Some(Banner::Stalled {
                price: session.buyer_price(),
            }),
            (None, Phase::Idle) | (None, Phase::Closed) => None,
        };

        let history = session
            .history()
            .iter()
            .map(|entry| HistoryLine {
                actor: entry.actor,
                label: match entry.actor {
                    Actor::Buyer => "Buyer",
                    Actor::Seller => "Seller",
                },
                price: format_price(entry.price),
                time: local_time(entry.timestamp),
            })
            .collect();

        Self {
            current_price: format_price(session.current_price()),
            asking_price: format_price(session.initial_price()),
            floor_price: format_price(session.floor_price()),
            buttons_enabled: session.phase().accepts_proposals(),
            can_accept: session.phase() == Phase::CounterOffered,
            banner,
            history,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.banner, Some(Banner::Success { .. }))
    }
}

fn local_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}
