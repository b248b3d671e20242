//! Page cursor normalization
//!
//! Callers may send the cursor as `page_token` or as `next_page_token`; both
//! name the same opaque upstream token. Responses always carry the cursor under
//! both `nextPageToken` and `next_page_token` with the identical value, or both
//! `null` on the last page. The cursor itself is never inspected.

use serde::{Deserialize, Serialize};

use crate::quota::{OrderStrategy, QuotaEstimate};

/// Inbound cursor fields accepted by every paginated tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageTokenArgs {
    #[serde(default)]
    pub page_token: Option<String>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl PageTokenArgs {
    pub fn effective_cursor(&self) -> Option<String> {
        resolve_cursor(self.page_token.as_deref(), self.next_page_token.as_deref())
    }
}

/// Resolve the single effective cursor from the canonical and alias fields
///
/// The canonical `page_token` wins whenever it is present, even if it differs
/// from the alias or is blank. A blank winner means the first page.
pub fn resolve_cursor(canonical: Option<&str>, alias: Option<&str>) -> Option<String> {
    canonical
        .or(alias)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

/// Outbound cursor, serialized under both field names
///
/// Only constructible through [`PageCursor::new`], so the two fields can never
/// diverge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageCursor {
    #[serde(rename = "nextPageToken")]
    canonical: Option<String>,
    #[serde(rename = "next_page_token")]
    alias: Option<String>,
}

impl PageCursor {
    pub fn new(next: Option<String>) -> Self {
        let next = next.filter(|t| !t.is_empty());
        Self {
            canonical: next.clone(),
            alias: next,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.canonical.is_some()
    }
}

/// Ordering actually used for a channel listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedOrder {
    pub strategy: OrderStrategy,
    pub by: String,
}

/// One page of a listing as produced by a domain operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage<T> {
    pub items: Vec<T>,
    /// Emitted only through [`normalize_page`]
    #[serde(skip)]
    pub next_page_token: Option<String>,
    pub quota_estimate: QuotaEstimate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_max_videos: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_order: Option<AppliedOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> ListingPage<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>, quota_estimate: QuotaEstimate) -> Self {
        Self {
            items,
            next_page_token,
            quota_estimate,
            truncated: None,
            applied_max_videos: None,
            applied_order: None,
            comments_disabled: None,
            warnings: Vec::new(),
        }
    }
}

/// A listing page with its cursor under both names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPage<T> {
    #[serde(flatten)]
    pub page: ListingPage<T>,
    #[serde(flatten)]
    pub cursor: PageCursor,
}

/// Attach the dual-named cursor to a page
pub fn normalize_page<T>(page: ListingPage<T>) -> NormalizedPage<T> {
    let cursor = PageCursor::new(page.next_page_token.clone());
    NormalizedPage { page, cursor }
}
