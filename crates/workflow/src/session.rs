use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tashreef_core::Identity;
use tashreef_gateway::{GenerationGateway, HttpGenerationGateway};
use tashreef_identity::{FileKeyValueStore, IdentityStore, KeyValueStore, MemoryKeyValueStore};
use tashreef_state::{install_navigation, ObservableStateStore};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::orchestrator::{SubmitError, Submission, WorkflowOrchestrator};

/// Everything one running client needs, wired once at startup.
///
/// Owns the single `ObservableStateStore`; display surfaces get clones of
/// its handle through [`Session::store`].
pub struct Session {
    config: ClientConfig,
    identities: IdentityStore,
    identity: RwLock<Identity>,
    // Serializes label changes so navigation is published in the same order.
    relabel: Mutex<()>,
    store: ObservableStateStore,
    orchestrator: WorkflowOrchestrator,
}

impl Session {
    /// Starts a session talking to the configured generation service.
    pub fn start(config: ClientConfig) -> Self {
        let gateway = HttpGenerationGateway::with_path(&config.service_url, &config.generate_path);
        Self::with_gateway(config, Arc::new(gateway))
    }

    pub fn with_gateway(config: ClientConfig, gateway: Arc<dyn GenerationGateway>) -> Self {
        let storage: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Arc::new(FileKeyValueStore::new(path)),
            None => Arc::new(MemoryKeyValueStore::new()),
        };
        let identities = IdentityStore::new(storage);
        let identity = identities.get_or_create_identity();

        let store = ObservableStateStore::new();
        install_navigation(&store, &identity);
        let orchestrator = WorkflowOrchestrator::new(store.clone(), gateway, &config);

        info!(
            display_name = %identity.display_name,
            degraded = identities.is_degraded(),
            "session started"
        );
        Self {
            config,
            identities,
            identity: RwLock::new(identity),
            relabel: Mutex::new(()),
            store,
            orchestrator,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn identity(&self) -> Identity {
        self.identity.read().clone()
    }

    /// Replaces the session's role labels and rebuilds the navigation.
    ///
    /// Navigation listeners run after the identity is updated and may read it.
    pub fn set_identity_labels<I, S>(&self, labels: I) -> Identity
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let _relabel = self.relabel.lock();
        let identity = {
            let mut current = self.identity.write();
            *current = current.clone().with_labels(labels);
            current.clone()
        };
        install_navigation(&self.store, &identity);
        identity
    }

    /// Sets an explicit display name, persisted when storage is available.
    pub fn rename(&self, display_name: &str) -> Identity {
        let renamed = match self.identities.set_display_name(display_name) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error = %e, "display name not persisted");
                self.identity.read().clone().with_display_name(display_name)
            }
        };
        let mut identity = self.identity.write();
        identity.display_name = renamed.display_name;
        identity.clone()
    }

    pub fn store(&self) -> &ObservableStateStore {
        &self.store
    }

    pub fn orchestrator(&self) -> &WorkflowOrchestrator {
        &self.orchestrator
    }

    pub fn submit(&self, prompt_text: impl Into<String>) -> Result<Submission, SubmitError> {
        self.orchestrator.submit(prompt_text)
    }
}
