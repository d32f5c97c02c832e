use tashreef_core::{Identity, NavigationDescriptor, ADMIN_LABEL};
use tracing::debug;

use crate::store::ObservableStateStore;

/// Menu entries for `identity`, in display order.
///
/// Everyone gets About and Tutorial; the `admin` label appends user management.
pub fn navigation_for(identity: &Identity) -> Vec<NavigationDescriptor> {
    let mut items = vec![
        NavigationDescriptor::new("dashboard", "About", "/", "home"),
        NavigationDescriptor::new("chat", "Tutorial", "/chat", "comments"),
    ];
    if identity.has_label(ADMIN_LABEL) {
        items.push(NavigationDescriptor::new(
            "manage-users",
            "Manage Users",
            "/admin/users",
            "users-cog",
        ));
    }
    items
}

/// Rebuilds the navigation for `identity` and publishes it. Call again whenever labels change.
pub fn install_navigation(store: &ObservableStateStore, identity: &Identity) {
    let items = navigation_for(identity);
    debug!(entries = items.len(), "installing navigation");
    store.set_nav_items(items);
}
