//! Pagination module
//!
//! Cursor-based pagination: each page carries an optional continuation token
//! that is injected into the next request.
//!
//! # Overview
//!
//! - [`PageShape`] locates the record array and the cursor in a body
//! - [`Page`] and [`ResultSet`] hold what was fetched
//! - [`PageWalker`] follows cursors under a page cap

mod types;
mod walker;

pub use types::{extract_path, Page, PageShape, ResultSet};
pub use walker::PageWalker;
