use tokio::sync::mpsc;
use tracing::info;

use super::{
    rules::COUNTERPARTY_DELAY,
    session::{CommandRejected, NegotiationEvent, NegotiationSession, ResponseTicket},
    timer::CounterpartyTimer,
};
use crate::models::Product;

/// Message delivered when a seller evaluation is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterpartyDue(pub ResponseTicket);

/// A live negotiation: the session plus its scheduled seller evaluation.
///
/// Lives as long as the dialog showing it. Dropping or closing it cancels any
/// evaluation still in flight, so a discarded session is never mutated.
#[derive(Debug)]
pub struct Negotiation {
    product: Product,
    session: NegotiationSession,
    timer: CounterpartyTimer,
    responses: mpsc::Sender<CounterpartyDue>,
}

impl Negotiation {
    /// Open a fresh negotiation over `product`; due evaluations are sent to `responses`.
    pub fn open(product: Product, responses: mpsc::Sender<CounterpartyDue>) -> Self {
        let session = NegotiationSession::new(&product);
        info!(
            session = session.id(),
            product = %product.id,
            initial_price = product.initial_price,
            "Negotiation opened"
        );
        Self {
            product,
            session,
            timer: CounterpartyTimer::new(),
            responses,
        }
    }

    /// Listing under negotiation.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Read-only view of the session state.
    pub fn session(&self) -> &NegotiationSession {
        &self.session
    }

    /// UP command.
    pub fn raise(&mut self) -> Result<NegotiationEvent, CommandRejected> {
        let event = self.session.raise()?;
        Ok(self.schedule(event))
    }

    /// DOWN command.
    pub fn lower(&mut self) -> Result<NegotiationEvent, CommandRejected> {
        let event = self.session.lower()?;
        Ok(self.schedule(event))
    }

    /// Propose an exact price.
    pub fn propose(&mut self, price: u64) -> Result<NegotiationEvent, CommandRejected> {
        let event = self.session.propose(price)?;
        Ok(self.schedule(event))
    }

    /// Accept the seller's counter-offer.
    pub fn accept_counter(&mut self) -> Result<NegotiationEvent, CommandRejected> {
        self.session.accept_counter()
    }

    /// Apply a due evaluation; deliveries for other sessions or rounds are rejected.
    pub fn resolve(&mut self, due: CounterpartyDue) -> Result<NegotiationEvent, CommandRejected> {
        self.session.resolve(due.0)
    }

    /// Whether a seller evaluation is scheduled and not yet delivered.
    #[cfg(test)]
    pub(crate) fn has_pending_response(&self) -> bool {
        self.timer.is_pending()
    }

    /// Cancel in-flight work and hand back the final session state.
    pub fn close(mut self) -> NegotiationSession {
        self.timer.cancel();
        info!(
            session = self.session.id(),
            phase = ?self.session.phase(),
            "Negotiation closed"
        );
        self.session
    }

    fn schedule(&mut self, event: NegotiationEvent) -> NegotiationEvent {
        if let NegotiationEvent::Proposed { ticket, .. } = event {
            self.timer.schedule(
                COUNTERPARTY_DELAY,
                self.responses.clone(),
                CounterpartyDue(ticket),
            );
        }
        event
    }
}
