//! Core library for ytmcp
//!
//! This crate implements the **Functional Core** of the ytmcp application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The ytmcp project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`ytmcp_core`** (this crate): Pure transformation functions with zero I/O
//! - **`ytmcp`**: HTTP, timers, locking and orchestration (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no clocks, no sleeping
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! Stateful pieces (the quota ledger, the retry state) are plain values that
//! the shell owns and mutates; they never reach for the network or the clock.
//!
//! # Module Organization
//!
//! - [`allowlist`]: The closed set of upstream endpoints and their quota costs
//! - [`request`]: Request specifications, fixed-destination URL building and
//!   credential redaction
//! - [`retry`]: Retry policy and the per-call retry state machine
//! - [`decode`]: Gzip detection, decompression and JSON decoding of bodies
//! - [`quota`]: Quota ledger, period keys and per-tool quota estimation
//! - [`pagination`]: Page cursor alias resolution and dual-named output
//! - [`error`]: Typed failures with stable reason codes
//! - [`youtube`]: Channel/video reference parsing, classification and
//!   response extraction
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use ytmcp_core::pagination::{normalize_page, ListingPage, PageTokenArgs};
//! use ytmcp_core::quota::QuotaEstimate;
//!
//! let args = PageTokenArgs {
//!     page_token: None,
//!     next_page_token: Some("CAUQAA".to_string()),
//! };
//! assert_eq!(args.effective_cursor().as_deref(), Some("CAUQAA"));
//!
//! let page = ListingPage::new(vec![1, 2, 3], Some("CAoQAA".to_string()), QuotaEstimate::units(2));
//! let out = serde_json::to_value(normalize_page(page)).unwrap();
//! assert_eq!(out["nextPageToken"], out["next_page_token"]);
//! ```

pub mod allowlist;
pub mod decode;
pub mod error;
pub mod pagination;
pub mod quota;
pub mod request;
pub mod retry;
pub mod youtube;
