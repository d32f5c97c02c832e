//! Device-local key/value storage and the anonymous identity built on it.

pub mod file;
pub mod identity;
pub mod memory;
pub mod traits;

pub use file::FileKeyValueStore;
pub use identity::{IdentityStore, DISPLAY_NAME_KEY, TOKEN_KEY};
pub use memory::MemoryKeyValueStore;
pub use traits::{KeyValueStore, StorageError};
