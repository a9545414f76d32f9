//! Local regime: the redirection graph stored in SQLite.
//!
//! Relations are foreign keys, relationship lookups are SQL queries and every
//! manager operation runs inside one transaction (see [`SqliteGraphStore`]'s
//! `required`). Owned network elements are deleted explicitly with their owner.

mod helpers;
mod impl_;
pub mod schema;
mod transaction;

pub use impl_::SqliteGraphStore;
