//! # Page specs
//!
//! One module per senate.gov page type. Each spec encodes *where the data
//! lives in the markup* and *how to read it into typed records*.
//!
//! ## What lives here
//! - **Pure parsing** of already-fetched markup: no network, no sleeping.
//! - **Selector choice** for the listing table (`#listOfVotes`) and the
//!   detail-page blocks (`div.contenttext`, `div.newspaperDisplay_3column`).
//! - **Validation at the boundary**: a page either yields typed records or a
//!   [`ParseError`](crate::error::ParseError) naming what was missing.
//!
//! ## What does **not** live here
//! - Fetching, retries and pauses (`core::net`, `scrape`).
//! - Writing files (`dataset`).
//!
//! ## Typical call chain
//! ```text
//! scrape::collect_year → PageSource::fetch(listing) → specs::vote_list::parse_listing
//!                      → PageSource::fetch(detail)  → specs::vote_detail::parse_detail
//! ```
//!
//! ## Conventions
//! - A page-level structural mismatch is an error; a single bad senator line
//!   is a [`RowWarning`](crate::error::RowWarning) and the page survives.
//! - Specs are tested offline against inline fixtures that mirror the live
//!   markup.
pub mod vote_detail;
pub mod vote_list;
