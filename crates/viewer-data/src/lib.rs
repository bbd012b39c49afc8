//! viewer-data: In-memory datasets for the earnings results viewer.
//!
//! Loads CSV result files into [`Table`] snapshots cached by modification
//! time, filters and paginates their rows, and serves the precomputed
//! sample-call catalog with its own filters and sort orders.

pub mod cache;
pub mod calls;
pub mod error;
pub mod paging;
pub mod rows;
pub mod table;

pub use cache::DatasetCache;
pub use calls::{CallCatalog, CallFilter, CallPage, SampleCall, SortBy};
pub use error::{DataError, Result};
pub use paging::PageRequest;
pub use rows::{Facets, RowFilter, RowPage};
pub use table::{Cell, Table};
