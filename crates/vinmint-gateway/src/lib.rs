//! HTTP surface for VIN issuance.
//!
//! Exposes batch generation, stateless code validation and read-only counter
//! inspection over JSON. The router is built by [`app::App::router`].

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use state::AppState;
