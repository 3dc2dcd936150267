//! UP/DOWN price negotiation against a simulated seller.

mod controller;
pub mod rules;
mod session;
mod timer;

pub use controller::{CounterpartyDue, Negotiation};
pub use rules::{CounterpartyResponse, COUNTERPARTY_DELAY};
pub use session::{
    Actor, CommandRejected, HistoryEntry, NegotiationEvent, NegotiationSession, Phase,
    ResponseTicket,
};
