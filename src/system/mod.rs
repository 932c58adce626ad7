//! System implementations for the StoreSystem trait
//!
//! - `LocalSystem`: direct filesystem access (local disks and mounted shares)
//! - `MockSystem`: in-memory implementation for testing (in tests module)

mod local;

pub use local::LocalSystem;

#[cfg(test)]
pub mod mock;

#[cfg(test)]
pub use mock::MockSystem;
