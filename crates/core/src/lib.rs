#![warn(clippy::all, missing_docs)]

//! Core domain logic for the UpDown marketplace.
//!
//! This crate hosts the listing models, the read-only catalog, the
//! UP/DOWN negotiation engine with its simulated seller, and
//! configuration handling used by the terminal UI and any future
//! frontends.

pub mod catalog;
pub mod config;
pub mod models;
pub mod negotiation;

pub use catalog::{Catalog, CatalogError};
pub use config::AppConfig;
pub use models::{format_price, Product, Seller};
pub use negotiation::{
    Actor, CommandRejected, CounterpartyDue, HistoryEntry, Negotiation, NegotiationEvent,
    NegotiationSession, Phase,
};
