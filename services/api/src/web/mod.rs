pub mod auth;
pub mod middleware;
pub mod notes;
pub mod rest;
pub mod router;
pub mod state;
pub mod users;

// Re-export the pieces the binaries need to build the server.
pub use middleware::resolve_identity;
pub use router::{cors_layer, router};
pub use state::AppState;
