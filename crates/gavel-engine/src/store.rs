//! Auction store — the single source of truth for auction state.
//!
//! Every record carries a monotonically increasing version; writers commit
//! with a compare-and-swap conditioned on the version they read. This is
//! the per-auction serialization primitive: two concurrent read-modify-
//! write cycles on the same auction cannot both commit against the same
//! version, so the loser observes the conflict and re-validates against
//! the fresh state. Cross-auction operations never contend with each
//! other.
//!
//! Only the bid engine (ongoing mutations) and the finalizer (the
//! terminal transition) write core fields.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use gavel_types::{Auction, AuctionId, AuctionStatus, GavelError, Result, constants};
use thiserror::Error;

/// Monotonic per-record version for conditional commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Version(pub u64);

impl Version {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Why a conditional commit was not applied.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The record disappeared between snapshot and commit.
    #[error("auction {0} not found")]
    NotFound(AuctionId),
    /// Another writer committed first; re-read and re-validate.
    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict { expected: Version, actual: Version },
}

struct Record {
    version: Version,
    auction: Auction,
}

/// In-process, versioned store of record keyed by auction id.
#[derive(Default)]
pub struct AuctionStore {
    records: RwLock<HashMap<AuctionId, Record>>,
}

impl AuctionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created auction at version 0.
    pub fn insert(&self, auction: Auction) -> AuctionId {
        let id = auction.id;
        self.records.write().unwrap().insert(
            id,
            Record {
                version: Version(0),
                auction,
            },
        );
        id
    }

    /// A point-in-time copy of the auction.
    #[must_use]
    pub fn get(&self, id: AuctionId) -> Option<Auction> {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .map(|r| r.auction.clone())
    }

    /// A copy of the auction plus the version to commit against.
    #[must_use]
    pub fn snapshot(&self, id: AuctionId) -> Option<(Auction, Version)> {
        self.records
            .read()
            .unwrap()
            .get(&id)
            .map(|r| (r.auction.clone(), r.version))
    }

    /// Conditionally replace the record: applied only if the stored
    /// version still equals `expected`.
    pub fn try_commit(
        &self,
        id: AuctionId,
        expected: Version,
        updated: Auction,
    ) -> std::result::Result<Version, CommitError> {
        let mut records = self.records.write().unwrap();
        let record = records.get_mut(&id).ok_or(CommitError::NotFound(id))?;
        if record.version != expected {
            return Err(CommitError::Conflict {
                expected,
                actual: record.version,
            });
        }
        record.version = expected.next();
        record.auction = updated;
        Ok(record.version)
    }

    /// Read-modify-write with internal conflict retry, for pure in-memory
    /// mutations (outcome marking, the terminal status claim). The
    /// closure must not block; gateway calls never happen in here.
    ///
    /// A closure error aborts without retrying — that is how guard
    /// failures (`AlreadyFinalized`, `TooEarly`) propagate atomically.
    pub fn update<R>(
        &self,
        id: AuctionId,
        f: impl Fn(&mut Auction) -> Result<R>,
    ) -> Result<R> {
        for _ in 0..constants::MAX_COMMIT_RETRIES {
            let (mut auction, version) = self
                .snapshot(id)
                .ok_or(GavelError::AuctionNotFound(id))?;
            let out = f(&mut auction)?;
            match self.try_commit(id, version, auction) {
                Ok(_) => return Ok(out),
                Err(CommitError::Conflict { .. }) => continue,
                Err(CommitError::NotFound(_)) => {
                    return Err(GavelError::AuctionNotFound(id));
                }
            }
        }
        Err(GavelError::StoreConflict(id))
    }

    /// All auctions, ordered by id (UUIDv7 — creation order).
    #[must_use]
    pub fn list(&self) -> Vec<Auction> {
        let records = self.records.read().unwrap();
        let mut auctions: Vec<Auction> = records.values().map(|r| r.auction.clone()).collect();
        auctions.sort_by_key(|a| a.id);
        auctions
    }

    /// Ongoing auctions whose deadline falls within `now + lookahead` —
    /// the deadline scheduler's scan set. Includes deadlines already in
    /// the past.
    #[must_use]
    pub fn due_for_settlement(&self, now: DateTime<Utc>, lookahead: Duration) -> Vec<AuctionId> {
        let horizon = now + lookahead;
        let records = self.records.read().unwrap();
        let mut due: Vec<AuctionId> = records
            .values()
            .filter(|r| {
                r.auction.status == AuctionStatus::Ongoing && r.auction.deadline <= horizon
            })
            .map(|r| r.auction.id)
            .collect();
        due.sort_unstable();
        due
    }

    /// Number of auctions in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}
