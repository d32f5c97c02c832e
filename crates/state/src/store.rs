use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tashreef_core::{GenerationResult, NavigationDescriptor, WorkflowStatus};
use tokio::sync::mpsc;
use tracing::debug;

/// What a committed write changed. Carries the new value of the field group.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    NavItems(Arc<Vec<NavigationDescriptor>>),
    GenerationResult(Option<Arc<GenerationResult>>),
    WorkflowStatus(WorkflowStatus),
    /// A result and the status announcing it, committed together.
    GenerationCompleted {
        result: Arc<GenerationResult>,
        status: WorkflowStatus,
    },
}

/// One committed write, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    /// Strictly increasing per store, starting at 1.
    pub revision: u64,
    pub change: StoreChange,
}

/// Consistent view of every field at one revision.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub nav_items: Arc<Vec<NavigationDescriptor>>,
    pub generation_result: Option<Arc<GenerationResult>>,
    pub workflow_status: WorkflowStatus,
}

type Listener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
struct State {
    revision: u64,
    nav_items: Arc<Vec<NavigationDescriptor>>,
    generation_result: Option<Arc<GenerationResult>>,
    workflow_status: WorkflowStatus,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Default)]
struct Inner {
    // Held for the whole commit + fan-out so listeners see writes in order.
    publish: Mutex<()>,
    state: RwLock<State>,
    listeners: Mutex<Listeners>,
}

/// Cross-cutting UI state shared by every display surface.
///
/// Constructed once by the composition root and handed out as a cloned
/// handle; clones share the same state. Values are published as `Arc`
/// snapshots, so a read never observes a half-written entity.
///
/// Listeners run synchronously on the writing thread, once per committed
/// write, in write order. They may read the store but must not write to it.
#[derive(Clone, Default)]
pub struct ObservableStateStore {
    inner: Arc<Inner>,
}

impl ObservableStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the full navigation sequence, preserving the given order.
    pub fn set_nav_items(&self, items: Vec<NavigationDescriptor>) -> u64 {
        self.commit(|state| {
            state.nav_items = Arc::new(items);
            StoreChange::NavItems(state.nav_items.clone())
        })
    }

    pub fn nav_items(&self) -> Arc<Vec<NavigationDescriptor>> {
        self.inner.state.read().nav_items.clone()
    }

    /// Replaces the current result; `None` clears it.
    pub fn set_generation_result(&self, result: Option<GenerationResult>) -> u64 {
        self.commit(|state| {
            state.generation_result = result.map(Arc::new);
            StoreChange::GenerationResult(state.generation_result.clone())
        })
    }

    pub fn generation_result(&self) -> Option<Arc<GenerationResult>> {
        self.inner.state.read().generation_result.clone()
    }

    pub fn set_workflow_status(&self, status: WorkflowStatus) -> u64 {
        self.commit(|state| {
            state.workflow_status = status;
            StoreChange::WorkflowStatus(state.workflow_status.clone())
        })
    }

    /// Stores a new result and its status as one write.
    pub fn complete_generation(&self, result: GenerationResult, status: WorkflowStatus) -> u64 {
        self.commit(|state| {
            let result = Arc::new(result);
            state.generation_result = Some(result.clone());
            state.workflow_status = status.clone();
            StoreChange::GenerationCompleted { result, status }
        })
    }

    pub fn workflow_status(&self) -> WorkflowStatus {
        self.inner.state.read().workflow_status.clone()
    }

    /// Revision of the last committed write; 0 before any write.
    pub fn revision(&self) -> u64 {
        self.inner.state.read().revision
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.inner.state.read();
        StoreSnapshot {
            revision: state.revision,
            nav_items: state.nav_items.clone(),
            generation_result: state.generation_result.clone(),
            workflow_status: state.workflow_status.clone(),
        }
    }

    /// Registers `listener` for every later write. Dropping the returned
    /// handle unsubscribes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&StoreEvent) + Send + Sync + 'static,
    {
        let mut listeners = self.inner.listeners.lock();
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.entries.push((id, Arc::new(listener)));
        debug!(subscription = id, "store subscriber added");
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Async stream of every later write.
    pub fn events(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            // Receiver gone means the stream was dropped; its subscription goes with it.
            let _ = tx.send(event.clone());
        });
        EventStream {
            rx,
            _subscription: subscription,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().entries.len()
    }

    fn commit(&self, apply: impl FnOnce(&mut State) -> StoreChange) -> u64 {
        let _publish = self.inner.publish.lock();
        let event = {
            let mut state = self.inner.state.write();
            state.revision += 1;
            let change = apply(&mut state);
            StoreEvent {
                revision: state.revision,
                change,
            }
        };

        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        debug!(revision = event.revision, subscribers = listeners.len(), "store write committed");
        for listener in &listeners {
            listener(&event);
        }
        event.revision
    }
}

/// Live subscription. Unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.lock().entries.retain(|(id, _)| *id != self.id);
            debug!(subscription = self.id, "store subscriber removed");
        }
    }
}

/// Every store write after creation, in write order.
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<StoreEvent>,
    _subscription: Subscription,
}

impl EventStream {
    /// Next write. Waits until one is committed.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered write, if any.
    pub fn try_recv(&mut self) -> Option<StoreEvent> {
        self.rx.try_recv().ok()
    }
}
