//! Durable client-side key/value storage.
//!
//! The session identifier lives here so it survives restarts. Implementations
//! must be cheap to call from synchronous code; values are small strings.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}
