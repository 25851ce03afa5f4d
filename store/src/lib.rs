//! Splitledger Store
//!
//! Ports to the external persistence, membership, and identity collaborators,
//! plus an in-memory reference implementation used by tests and the
//! simulator.

pub mod memory;
pub mod ports;

pub use memory::{MemoryDirectory, MemoryStore};
pub use ports::{IdentityProvider, LedgerStore, MembershipProvider};
