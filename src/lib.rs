//! chartledger keeps chart definitions under full version control: every
//! edit appends an immutable snapshot to a per-definition ledger, an
//! approval gate decides when a version becomes the visible head, and
//! rollback replays an old snapshot as a brand-new version so history is
//! never rewritten.

pub mod auth;
pub mod database;
pub mod diff;
pub mod errors;
pub mod server;
pub mod services;
pub mod snapshot;
