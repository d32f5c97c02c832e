use std::sync::Arc;

use parking_lot::Mutex;
use tashreef_core::{derive_display_name, Identity};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::memory::MemoryKeyValueStore;
use crate::traits::{KeyValueStore, StorageError};

/// Storage key of the identity token.
pub const TOKEN_KEY: &str = "identity.token";
/// Storage key of the display name.
pub const DISPLAY_NAME_KEY: &str = "identity.displayName";

/// Resolves the device's anonymous identity, creating it on first use.
///
/// Storage failures never reach the caller. The first failure switches the
/// instance to an in-memory identity that it keeps returning afterwards.
pub struct IdentityStore {
    storage: Arc<dyn KeyValueStore>,
    degraded: Mutex<Option<Identity>>,
}

impl IdentityStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            degraded: Mutex::new(None),
        }
    }

    /// Identity store over non-durable memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// True once storage failed and the in-memory identity is in use.
    pub fn is_degraded(&self) -> bool {
        self.degraded.lock().is_some()
    }

    /// Returns the stored identity, creating or repairing it as needed.
    pub fn get_or_create_identity(&self) -> Identity {
        let mut degraded = self.degraded.lock();
        if let Some(identity) = degraded.as_ref() {
            return identity.clone();
        }

        let token = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "identity storage unavailable; using in-memory identity");
                let identity = Identity::from_token(new_token());
                *degraded = Some(identity.clone());
                return identity;
            }
        };

        let Some(token) = token else {
            let identity = Identity::from_token(new_token());
            if let Err(e) = self.persist_new(&identity) {
                warn!(error = %e, "failed to persist new identity; continuing in memory");
                *degraded = Some(identity.clone());
                return identity;
            }
            info!(display_name = %identity.display_name, "created anonymous identity");
            return identity;
        };

        match self.storage.get(DISPLAY_NAME_KEY) {
            Ok(Some(name)) if !name.is_empty() => {
                debug!(display_name = %name, "loaded identity");
                Identity::from_token(token).with_display_name(name)
            }
            Ok(_) => self.repair_display_name(token),
            Err(e) => {
                // The token is readable, so the derived name is the one a repair would write.
                warn!(error = %e, "could not read display name; deriving it");
                Identity::from_token(token)
            }
        }
    }

    /// Persists an explicit display name for the existing identity.
    pub fn set_display_name(&self, display_name: &str) -> Result<Identity, StorageError> {
        let identity = self.get_or_create_identity();
        if self.is_degraded() {
            let mut degraded = self.degraded.lock();
            let renamed = identity.with_display_name(display_name);
            *degraded = Some(renamed.clone());
            return Ok(renamed);
        }
        self.storage.set(DISPLAY_NAME_KEY, display_name)?;
        Ok(identity.with_display_name(display_name))
    }

    fn persist_new(&self, identity: &Identity) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, &identity.id)?;
        self.storage.set(DISPLAY_NAME_KEY, &identity.display_name)
    }

    fn repair_display_name(&self, token: String) -> Identity {
        let display_name = derive_display_name(&token);
        match self.storage.set(DISPLAY_NAME_KEY, &display_name) {
            Ok(()) => info!(display_name = %display_name, "repaired missing display name"),
            Err(e) => warn!(error = %e, "failed to persist repaired display name"),
        }
        Identity::from_token(token)
    }
}

/// 128 random bits from the OS generator, UUID-shaped.
fn new_token() -> String {
    Uuid::new_v4().to_string()
}
