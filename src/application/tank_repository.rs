// Repository trait for tank backend access
use crate::application::error::FetchError;
use crate::domain::fields::RawRecord;
use async_trait::async_trait;

/// Raw records come back untouched; normalization happens in the refresh pipeline.
#[async_trait]
pub trait TankRepository: Send + Sync {
    /// List site records (id/code and name)
    async fn list_sites(&self) -> Result<Vec<RawRecord>, FetchError>;

    /// List tank readings, optionally filtered to one site
    async fn list_tanks(&self, site: Option<&str>) -> Result<Vec<RawRecord>, FetchError>;

    /// Archived calibration readings for one tank, newest first where the backend sorts
    async fn list_history(
        &self,
        site: &str,
        tank: &str,
        limit: usize,
    ) -> Result<Vec<RawRecord>, FetchError>;

    /// `Some(changed)` from the status endpoint, `None` when the backend has none
    async fn changes_detected(&self) -> Result<Option<bool>, FetchError>;
}
