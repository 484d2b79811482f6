pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use presentation::app::router;
pub use presentation::app_state::AppState;
