pub mod auth;
pub mod books;
pub mod genres;

use shelf_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register the session core module and every application module
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register_core(shelf_authz::create_module(state.sessions.clone()));

    registry.register_custom(auth::create_module(state.clone()));
    registry.register_custom(genres::create_module(state.clone()));
    registry.register_custom(books::create_module(state.clone()));
}
