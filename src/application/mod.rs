// Application layer - Use cases over the repository and the card surface
pub mod dashboard_state;
pub mod error;
pub mod history;
pub mod refresh_driver;
pub mod render_cache;
pub mod sites;
pub mod surface;
pub mod tank_repository;

#[cfg(test)]
pub(crate) mod testing;
