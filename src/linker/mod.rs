//! Identity-to-account reconciliation: the get-or-create-and-link procedure
//! and its per-subject serialization.

mod locks;
mod reconcile;

pub use locks::KeyedLocks;
pub use reconcile::{AccountLinker, LinkOutcome, ProfileHints};
