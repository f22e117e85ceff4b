//! Cursor pagination over a wallet's ledger history.
//!
//! History is read newest first. A page is requested with an optional
//! `(created_before, id_before)` cursor; the next page is requested with
//! the last returned entry's `(created_at, id)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::ledger_time;
use crate::Transaction;

/// Page size used when the caller gives none, or a non-positive one.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Caller-facing history request. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Inclusive upper bound on `created_at`.
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,

    /// Exclusive upper bound on `id`.
    #[serde(default)]
    pub id_before: Option<i64>,

    /// Maximum number of entries.
    #[serde(default)]
    pub limit: Option<i64>,
}

impl HistoryQuery {
    /// First page with the default size.
    #[must_use]
    pub const fn latest() -> Self {
        Self {
            created_before: None,
            id_before: None,
            limit: None,
        }
    }

    /// Set the page size.
    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the cursor explicitly.
    #[must_use]
    pub fn before(mut self, created_at: DateTime<Utc>, id: i64) -> Self {
        self.created_before = Some(created_at);
        self.id_before = Some(id);
        self
    }

    /// Query for the page that follows `page`, or `None` if `page` is empty.
    #[must_use]
    pub fn after(&self, page: &[Transaction]) -> Option<Self> {
        page.last()
            .map(|last| Self::latest().before(last.created_at, last.id))
            .map(|next| Self {
                limit: self.limit,
                ..next
            })
    }

    /// Apply defaults against the current time.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> HistoryCursor {
        HistoryCursor {
            created_before: ledger_time(&self.created_before.unwrap_or(now)),
            id_before: self.id_before.unwrap_or(i64::MAX),
            limit: self
                .limit
                .filter(|limit| *limit > 0)
                .unwrap_or(DEFAULT_PAGE_LIMIT),
        }
    }
}

/// Fully resolved history request, as handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryCursor {
    /// Inclusive upper bound on `created_at`.
    pub created_before: DateTime<Utc>,

    /// Exclusive upper bound on `id`.
    pub id_before: i64,

    /// Maximum number of entries, always positive.
    pub limit: i64,
}

impl HistoryCursor {
    /// Check whether an entry belongs to this page: created no later than
    /// `created_before`, with an id below `id_before`.
    #[must_use]
    pub fn admits(&self, created_at: DateTime<Utc>, id: i64) -> bool {
        created_at <= self.created_before && id < self.id_before
    }
}
