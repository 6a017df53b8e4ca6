//! In-process password-reset tickets.
//!
//! A ticket binds the three recovery steps to one account. It is minted when
//! the account is identified, advanced once the security answers check out,
//! and consumed when the password is replaced. Tickets never persist; a
//! restart simply forces callers to start over.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// How far a reset attempt has progressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketStage {
    IdentityVerified,
    QuestionsVerified,
}

/// One password-reset attempt in flight.
#[derive(Clone, Debug)]
pub struct ResetTicket {
    pub ticket_id: Uuid,
    pub account_id: Uuid,
    pub stage: TicketStage,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Mutex-guarded ticket map with lazy expiry.
///
/// Expired entries are swept whenever a ticket is minted and treated as
/// absent on read; there is no background task.
pub struct TicketStore {
    ttl: Duration,
    tickets: Mutex<HashMap<Uuid, ResetTicket>>,
}

impl TicketStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tickets: Mutex::new(HashMap::new()),
        }
    }

    /// Mint a stage-one ticket for an account.
    pub async fn create(&self, account_id: Uuid, now: DateTime<Utc>) -> ResetTicket {
        let ticket = ResetTicket {
            ticket_id: Uuid::new_v4(),
            account_id,
            stage: TicketStage::IdentityVerified,
            issued_at: now,
            expires_at: now + self.ttl,
        };
        let mut tickets = self.tickets.lock().await;
        tickets.retain(|_, entry| entry.expires_at > now);
        tickets.insert(ticket.ticket_id, ticket.clone());
        ticket
    }

    /// Look up a live ticket; an expired one is dropped and reads as absent.
    pub async fn get(&self, ticket_id: Uuid, now: DateTime<Utc>) -> Option<ResetTicket> {
        let mut tickets = self.tickets.lock().await;
        match tickets.get(&ticket_id) {
            Some(ticket) if ticket.expires_at > now => Some(ticket.clone()),
            Some(_) => {
                tickets.remove(&ticket_id);
                None
            }
            None => None,
        }
    }

    /// Move a stage-one ticket forward and refresh its deadline.
    ///
    /// Returns `None` for a missing, expired, or already-advanced ticket, so
    /// a lost race reads the same as an expired ticket.
    pub async fn advance(&self, ticket_id: Uuid, now: DateTime<Utc>) -> Option<ResetTicket> {
        let mut tickets = self.tickets.lock().await;
        let ticket = tickets.get_mut(&ticket_id)?;
        if ticket.expires_at <= now || ticket.stage != TicketStage::IdentityVerified {
            return None;
        }
        ticket.stage = TicketStage::QuestionsVerified;
        ticket.expires_at = now + self.ttl;
        Some(ticket.clone())
    }

    /// Drop a ticket, completed or abandoned.
    pub async fn remove(&self, ticket_id: Uuid) {
        self.tickets.lock().await.remove(&ticket_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TicketStore {
        TicketStore::new(Duration::minutes(10))
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = store();
        let now = Utc::now();
        let account_id = Uuid::new_v4();

        let ticket = store.create(account_id, now).await;
        assert_eq!(ticket.stage, TicketStage::IdentityVerified);
        assert_eq!(ticket.expires_at, now + Duration::minutes(10));

        let fetched = store.get(ticket.ticket_id, now).await.unwrap();
        assert_eq!(fetched.account_id, account_id);
        assert_eq!(fetched.stage, TicketStage::IdentityVerified);
    }

    #[tokio::test]
    async fn expired_ticket_reads_as_absent() {
        let store = store();
        let now = Utc::now();
        let ticket = store.create(Uuid::new_v4(), now).await;

        let later = now + Duration::minutes(10);
        assert!(store.get(ticket.ticket_id, later).await.is_none());
        // Dropped on the expired read, not merely hidden.
        assert!(store.get(ticket.ticket_id, now).await.is_none());
    }

    #[tokio::test]
    async fn advance_flips_stage_and_refreshes_deadline() {
        let store = store();
        let now = Utc::now();
        let ticket = store.create(Uuid::new_v4(), now).await;

        let later = now + Duration::minutes(9);
        let advanced = store.advance(ticket.ticket_id, later).await.unwrap();
        assert_eq!(advanced.stage, TicketStage::QuestionsVerified);
        assert_eq!(advanced.expires_at, later + Duration::minutes(10));

        // Forward-only: a second advance loses.
        assert!(store.advance(ticket.ticket_id, later).await.is_none());
    }

    #[tokio::test]
    async fn advance_refuses_expired_tickets() {
        let store = store();
        let now = Utc::now();
        let ticket = store.create(Uuid::new_v4(), now).await;
        assert!(store
            .advance(ticket.ticket_id, now + Duration::minutes(11))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn remove_consumes_the_ticket() {
        let store = store();
        let now = Utc::now();
        let ticket = store.create(Uuid::new_v4(), now).await;
        store.remove(ticket.ticket_id).await;
        assert!(store.get(ticket.ticket_id, now).await.is_none());
    }

    #[tokio::test]
    async fn minting_sweeps_expired_entries() {
        let store = store();
        let now = Utc::now();
        let stale = store.create(Uuid::new_v4(), now).await;

        let later = now + Duration::minutes(11);
        let fresh = store.create(Uuid::new_v4(), later).await;

        let tickets = store.tickets.lock().await;
        assert!(!tickets.contains_key(&stale.ticket_id));
        assert!(tickets.contains_key(&fresh.ticket_id));
    }
}
