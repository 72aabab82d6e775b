//! Persistence seam for submitted form responses.
//!
//! The engine crate assembles a `Response` and hands it here; everything
//! about where responses live is behind [`ResponseStore`]. The in-memory
//! backend covers the bundled server and tests; a durable backend
//! implements the same trait.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::MemoryResponseStore;
pub use traits::ResponseStore;
