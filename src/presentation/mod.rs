pub mod app;
pub mod app_state;
pub mod errors;
pub mod handlers;
pub mod html_surface;
pub mod page;
