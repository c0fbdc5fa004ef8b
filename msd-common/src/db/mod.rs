//! Schema definitions and cluster sessions

pub mod schema;
pub mod session;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use schema::*;
pub use session::*;

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemorySession;
