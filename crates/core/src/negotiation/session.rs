//! Negotiation session state machine.
//!
//! ```text
//! Idle / CounterOffered / Rejected --raise|lower|propose--> AwaitingResponse
//! AwaitingResponse --resolve--> Closed | CounterOffered | Rejected
//! CounterOffered --accept_counter--> Closed
//! ```
//!
//! Commands never fail loudly: anything issued outside its valid phase is
//! returned as a [`CommandRejected`] and leaves the session untouched.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::rules::{self, CounterpartyResponse};
use crate::models::Product;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the buyer's first move.
    Idle,
    /// Buyer proposed; the seller has not answered yet.
    AwaitingResponse,
    /// Seller answered with a counter-offer the buyer may accept.
    CounterOffered,
    /// Deal struck. Terminal.
    Closed,
    /// Seller declined; the buyer may try again.
    Rejected,
}

impl Phase {
    /// Whether buyer price commands are accepted in this phase.
    pub fn accepts_proposals(self) -> bool {
        matches!(self, Self::Idle | Self::CounterOffered | Self::Rejected)
    }
}

/// Who posted a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Actor {
    /// The local user.
    Buyer,
    /// The simulated seller.
    Seller,
}

/// One line of the negotiation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Who proposed the price.
    pub actor: Actor,
    /// Proposed price.
    pub price: u64,
    /// Wall-clock time the entry was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Identifies one scheduled seller evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseTicket {
    /// Session the evaluation belongs to.
    pub session: u64,
    /// Buyer proposal number within the session, starting at 1.
    pub round: u32,
}

/// Observable outcome of a command or seller evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationEvent {
    /// The buyer put a price on the table; the seller answers once `ticket` resolves.
    Proposed {
        /// Price the buyer proposed.
        price: u64,
        /// Evaluation to schedule.
        ticket: ResponseTicket,
    },
    /// The seller countered.
    CounterOffered {
        /// Seller's price.
        price: u64,
    },
    /// A deal was struck.
    DealStruck {
        /// Agreed price.
        final_price: u64,
    },
    /// The seller declined the buyer's price.
    Stalled {
        /// The declined price.
        price: u64,
    },
}

/// Why a command left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandRejected {
    /// Waiting on the seller's answer.
    #[error("waiting for the seller to respond")]
    Locked,
    /// The deal is already closed.
    #[error("negotiation already closed")]
    Closed,
    /// There is no counter-offer to accept.
    #[error("no counter-offer to accept")]
    NoCounterOffer,
    /// The evaluation is not the one the session is waiting for.
    #[error("seller response does not match the pending proposal")]
    StaleResponse,
}

/// State of one buyer/seller exchange over a single listing.
#[derive(Debug, Clone)]
pub struct NegotiationSession {
    id: u64,
    product_id: String,
    initial_price: u64,
    current_price: u64,
    buyer_price: u64,
    seller_price: u64,
    phase: Phase,
    final_price: Option<u64>,
    history: Vec<HistoryEntry>,
    round: u32,
}

impl NegotiationSession {
    /// Fresh session seeded from the listing's asking price.
    ///
    /// Any `current_bid` on the listing is display-only and ignored here.
    pub fn new(product: &Product) -> Self {
        let initial_price = product.initial_price;
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            product_id: product.id.clone(),
            initial_price,
            current_price: initial_price,
            buyer_price: initial_price,
            seller_price: initial_price,
            phase: Phase::Idle,
            final_price: None,
            history: Vec::new(),
            round: 0,
        }
    }

    /// Unique id of this session within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Asking price the session was seeded from.
    pub fn initial_price(&self) -> u64 {
        self.initial_price
    }

    /// Price currently on the table.
    pub fn current_price(&self) -> u64 {
        self.current_price
    }

    /// Last buyer proposal.
    pub fn buyer_price(&self) -> u64 {
        self.buyer_price
    }

    /// Last seller proposal.
    pub fn seller_price(&self) -> u64 {
        self.seller_price
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while a seller evaluation is outstanding.
    pub fn is_negotiating(&self) -> bool {
        self.phase == Phase::AwaitingResponse
    }

    /// Agreed price once a deal is struck.
    pub fn final_price(&self) -> Option<u64> {
        self.final_price
    }

    /// Buyer and seller proposals in submission order.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Lowest price a lowering command can reach.
    pub fn floor_price(&self) -> u64 {
        rules::floor_price(self.initial_price)
    }

    /// Evaluation currently awaited, if any.
    pub fn pending_ticket(&self) -> Option<ResponseTicket> {
        self.is_negotiating().then_some(ResponseTicket {
            session: self.id,
            round: self.round,
        })
    }

    /// UP: add 5% of the price on the table to the buyer's price.
    pub fn raise(&mut self) -> Result<NegotiationEvent, CommandRejected> {
        self.ensure_accepts_proposals()?;
        let price = self.buyer_price.saturating_add(rules::step(self.current_price));
        Ok(self.submit(price))
    }

    /// DOWN: take 5% of the price on the table off the buyer's price, never below the floor.
    pub fn lower(&mut self) -> Result<NegotiationEvent, CommandRejected> {
        self.ensure_accepts_proposals()?;
        let price = self
            .buyer_price
            .saturating_sub(rules::step(self.current_price))
            .max(self.floor_price());
        Ok(self.submit(price))
    }

    /// Propose an exact price, clamped to the floor.
    pub fn propose(&mut self, price: u64) -> Result<NegotiationEvent, CommandRejected> {
        self.ensure_accepts_proposals()?;
        let price = price.max(self.floor_price());
        Ok(self.submit(price))
    }

    /// Take the seller's counter-offer.
    pub fn accept_counter(&mut self) -> Result<NegotiationEvent, CommandRejected> {
        match self.phase {
            Phase::CounterOffered => {
                let final_price = self.seller_price;
                self.final_price = Some(final_price);
                self.phase = Phase::Closed;
                info!(session = self.id, final_price, "Counter-offer accepted");
                Ok(NegotiationEvent::DealStruck { final_price })
            }
            phase => {
                let rejection = match phase {
                    Phase::Closed => CommandRejected::Closed,
                    Phase::AwaitingResponse => CommandRejected::Locked,
                    _ => CommandRejected::NoCounterOffer,
                };
                debug!(session = self.id, ?phase, %rejection, "Accept ignored");
                Err(rejection)
            }
        }
    }

    /// Apply the seller's answer to the proposal identified by `ticket`.
    pub fn resolve(&mut self, ticket: ResponseTicket) -> Result<NegotiationEvent, CommandRejected> {
        if self.pending_ticket() != Some(ticket) {
            debug!(session = self.id, ?ticket, "Stale seller response dropped");
            return Err(CommandRejected::StaleResponse);
        }

        let buyer_price = self.buyer_price;
        let event = match rules::respond(self.initial_price, buyer_price) {
            CounterpartyResponse::Accept => {
                self.final_price = Some(buyer_price);
                self.phase = Phase::Closed;
                NegotiationEvent::DealStruck {
                    final_price: buyer_price,
                }
            }
            CounterpartyResponse::Counter(price) => {
                self.seller_price = price;
                self.current_price = price;
                self.history.push(HistoryEntry {
                    actor: Actor::Seller,
                    price,
                    timestamp: Utc::now(),
                });
                self.phase = Phase::CounterOffered;
                NegotiationEvent::CounterOffered { price }
            }
            CounterpartyResponse::Reject => {
                self.phase = Phase::Rejected;
                NegotiationEvent::Stalled { price: buyer_price }
            }
        };
        info!(session = self.id, round = self.round, ?event, "Seller responded");
        Ok(event)
    }

    fn ensure_accepts_proposals(&self) -> Result<(), CommandRejected> {
        let result = match self.phase {
            phase if phase.accepts_proposals() => return Ok(()),
            Phase::Closed => CommandRejected::Closed,
            _ => CommandRejected::Locked,
        };
        debug!(session = self.id, phase = ?self.phase, %result, "Command ignored");
        Err(result)
    }

    fn submit(&mut self, price: u64) -> NegotiationEvent {
        self.buyer_price = price;
        self.current_price = price;
        self.history.push(HistoryEntry {
            actor: Actor::Buyer,
            price,
            timestamp: Utc::now(),
        });
        self.round += 1;
        self.phase = Phase::AwaitingResponse;
        info!(
            session = self.id,
            product = %self.product_id,
            round = self.round,
            price,
            "Buyer proposed"
        );
        NegotiationEvent::Proposed {
            price,
            ticket: ResponseTicket {
                session: self.id,
                round: self.round,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Seller;

    fn product(initial_price: u64) -> Product {
        Product {
            id: "p1".to_string(),
            title: "Listing".to_string(),
            description: String::new(),
            image_url: String::new(),
            category: String::new(),
            seller: Seller {
                id: "s1".to_string(),
                name: "seller".to_string(),
                rating: 4.5,
            },
            initial_price,
            current_bid: None,
            is_auction_active: true,
            auction_end_time: None,
            location: String::new(),
            created_at: Utc::now(),
        }
    }

    fn ticket(event: NegotiationEvent) -> ResponseTicket {
        match event {
            NegotiationEvent::Proposed { ticket, .. } => ticket,
            other => panic!("expected a proposal, got {other:?}"),
        }
    }

    fn proposed_and_resolved(
        session: &mut NegotiationSession,
        price: u64,
    ) -> NegotiationEvent {
        let event = session.propose(price).expect("proposal accepted");
        session.resolve(ticket(event)).expect("response applied")
    }

    #[test]
    fn new_session_seeds_from_initial_price() {
        let mut listing = product(350_000);
        listing.current_bid = Some(320_000);
        let session = NegotiationSession::new(&listing);
        assert_eq!(session.current_price(), 350_000);
        assert_eq!(session.buyer_price(), 350_000);
        assert_eq!(session.seller_price(), 350_000);
        assert_eq!(session.phase(), Phase::Idle);
        assert!(!session.is_negotiating());
        assert!(session.final_price().is_none());
        assert!(session.history().is_empty());
        assert!(session.pending_ticket().is_none());
    }

    #[test]
    fn raise_closes_deal_for_hundred_thousand() {
        let mut session = NegotiationSession::new(&product(100_000));
        let event = session.raise().unwrap();
        assert_eq!(session.buyer_price(), 105_000);
        assert_eq!(session.current_price(), 105_000);
        assert!(session.is_negotiating());

        let outcome = session.resolve(ticket(event)).unwrap();
        assert_eq!(
            outcome,
            NegotiationEvent::DealStruck {
                final_price: 105_000
            }
        );
        assert_eq!(session.phase(), Phase::Closed);
        assert_eq!(session.final_price(), Some(105_000));
        assert!(!session.is_negotiating());
    }

    #[test]
    fn raise_steps_by_five_percent_of_current_price() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        proposed_and_resolved(&mut session, 700_000);
        assert_eq!(session.current_price(), 850_000);

        // the step is taken from the counter-offer on the table
        session.raise().unwrap();
        assert_eq!(session.buyer_price(), 700_000 + 42_500);
        assert_eq!(session.current_price(), 742_500);
    }

    #[test]
    fn lower_stops_at_the_floor() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        proposed_and_resolved(&mut session, 310_000);
        assert_eq!(session.phase(), Phase::Rejected);

        let event = session.lower().unwrap();
        assert_eq!(session.buyer_price(), 300_000);
        session.resolve(ticket(event)).unwrap();

        for _ in 0..5 {
            let event = session.lower().unwrap();
            assert_eq!(session.buyer_price(), 300_000);
            assert_eq!(session.current_price(), 300_000);
            assert_eq!(
                session.resolve(ticket(event)).unwrap(),
                NegotiationEvent::Stalled { price: 300_000 }
            );
        }
        // every lower is logged, even at the floor
        assert_eq!(session.history().len(), 7);
    }

    #[test]
    fn propose_is_clamped_to_the_floor() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        session.propose(10).unwrap();
        assert_eq!(session.buyer_price(), 300_000);
    }

    #[test]
    fn threshold_tiers() {
        let mut accepted = NegotiationSession::new(&product(1_000_000));
        assert_eq!(
            proposed_and_resolved(&mut accepted, 800_000),
            NegotiationEvent::DealStruck {
                final_price: 800_000
            }
        );
        assert_eq!(accepted.final_price(), Some(800_000));

        let mut countered = NegotiationSession::new(&product(1_000_000));
        assert_eq!(
            proposed_and_resolved(&mut countered, 700_000),
            NegotiationEvent::CounterOffered { price: 850_000 }
        );
        assert_eq!(countered.phase(), Phase::CounterOffered);
        assert_eq!(countered.seller_price(), 850_000);
        assert_eq!(countered.buyer_price(), 700_000);
        assert!(!countered.is_negotiating());

        let mut rejected = NegotiationSession::new(&product(1_000_000));
        assert_eq!(
            proposed_and_resolved(&mut rejected, 699_999),
            NegotiationEvent::Stalled { price: 699_999 }
        );
        assert_eq!(rejected.phase(), Phase::Rejected);
        assert_eq!(rejected.current_price(), 699_999);
        assert_eq!(rejected.seller_price(), 1_000_000);
        assert_eq!(rejected.history().len(), 1);
    }

    #[test]
    fn accept_counter_closes_at_seller_price() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        proposed_and_resolved(&mut session, 700_000);
        assert_eq!(
            session.accept_counter(),
            Ok(NegotiationEvent::DealStruck {
                final_price: 850_000
            })
        );
        assert_eq!(session.phase(), Phase::Closed);
        assert_eq!(session.final_price(), Some(850_000));
    }

    #[test]
    fn accept_counter_requires_a_counter_offer() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        assert_eq!(
            session.accept_counter(),
            Err(CommandRejected::NoCounterOffer)
        );
        session.propose(700_000).unwrap();
        assert_eq!(session.accept_counter(), Err(CommandRejected::Locked));
    }

    #[test]
    fn commands_are_ignored_while_awaiting_response() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        session.raise().unwrap();
        let before = session.clone();
        assert_eq!(session.raise(), Err(CommandRejected::Locked));
        assert_eq!(session.lower(), Err(CommandRejected::Locked));
        assert_eq!(session.propose(1), Err(CommandRejected::Locked));
        assert_eq!(session.buyer_price(), before.buyer_price());
        assert_eq!(session.history(), before.history());
    }

    #[test]
    fn closed_session_is_immutable() {
        let mut session = NegotiationSession::new(&product(100_000));
        let event = session.raise().unwrap();
        session.resolve(ticket(event)).unwrap();
        let history = session.history().to_vec();

        assert_eq!(session.raise(), Err(CommandRejected::Closed));
        assert_eq!(session.lower(), Err(CommandRejected::Closed));
        assert_eq!(session.propose(90_000), Err(CommandRejected::Closed));
        assert_eq!(session.accept_counter(), Err(CommandRejected::Closed));
        assert_eq!(
            session.resolve(ticket(event)),
            Err(CommandRejected::StaleResponse)
        );
        assert_eq!(session.history(), history.as_slice());
        assert_eq!(session.final_price(), Some(105_000));
        assert_eq!(session.current_price(), 105_000);
    }

    #[test]
    fn stale_tickets_are_dropped() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        let first = ticket(session.propose(650_000).unwrap());
        session.resolve(first).unwrap();
        let second = ticket(session.propose(660_000).unwrap());

        assert_eq!(session.resolve(first), Err(CommandRejected::StaleResponse));
        let other = NegotiationSession::new(&product(1_000_000));
        let foreign = ResponseTicket {
            session: other.id(),
            round: second.round,
        };
        assert_eq!(
            session.resolve(foreign),
            Err(CommandRejected::StaleResponse)
        );
        assert!(session.is_negotiating());
        assert!(session.resolve(second).is_ok());
    }

    #[test]
    fn history_records_submission_order() {
        let mut session = NegotiationSession::new(&product(1_000_000));
        let event = session.propose(720_000).unwrap();
        assert_eq!(session.history().len(), 1);
        session.resolve(ticket(event)).unwrap();
        session.accept_counter().unwrap();

        let actors: Vec<_> = session
            .history()
            .iter()
            .map(|entry| (entry.actor, entry.price))
            .collect();
        assert_eq!(
            actors,
            vec![(Actor::Buyer, 720_000), (Actor::Seller, 860_000)]
        );
        assert!(session.history()[0].timestamp <= session.history()[1].timestamp);
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let listing = product(1_000);
        let first = NegotiationSession::new(&listing);
        let second = NegotiationSession::new(&listing);
        assert_ne!(first.id(), second.id());
    }
}
