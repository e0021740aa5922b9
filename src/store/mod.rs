//! Document-store contracts and record model for the linking core.
//! The real store is an external collaborator; `MemoryStore` is the dev/test
//! adapter over the same contracts.

mod model;
mod contract;
mod memory;

pub use model::{Account, NewAccount, NewUser, RecordId, User};
pub use contract::{AccountStore, UserStore};
pub use memory::MemoryStore;
