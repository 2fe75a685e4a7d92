//! Global ban registry.
//!
//! Two aggregates sit in front of the SQLite store, each pairing a table with
//! an in-memory index that answers hot-path membership checks:
//! - [`BanRegistry`]: globally banned users, indexed by user id.
//! - [`ChatPolicyRegistry`]: per-chat enforcement switches, indexing only the
//!   chats that opted out.
//!
//! Mutations hold the aggregate's lock across the store transaction and the
//! index refresh. Checks read the current index snapshot without locking, so
//! a reader racing a writer may see the state from just before its commit.

pub mod bans;
pub mod chats;
pub mod index;

pub use bans::BanRegistry;
pub use chats::ChatPolicyRegistry;
pub use index::SnapshotIndex;
pub use warden_db::{Result, StoreError};
