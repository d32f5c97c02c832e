//! Shared observable UI state and the navigation setup routine.

pub mod navigation;
pub mod store;

pub use navigation::{install_navigation, navigation_for};
pub use store::{EventStream, ObservableStateStore, StoreChange, StoreEvent, StoreSnapshot, Subscription};
