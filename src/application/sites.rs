// Site service - Use case for listing storage sites
use crate::application::dashboard_state::DashboardState;
use crate::application::error::FetchError;
use crate::application::tank_repository::TankRepository;
use crate::domain::normalize::normalize_site;
use crate::domain::reading::Site;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct SiteService {
    repository: Arc<dyn TankRepository>,
}

impl SiteService {
    pub fn new(repository: Arc<dyn TankRepository>) -> Self {
        Self { repository }
    }

    /// Sites deduplicated by id and sorted by code, numerically when both codes are numbers.
    pub async fn list_sites(&self) -> Result<Vec<Site>, FetchError> {
        let records = self.repository.list_sites().await?;
        let mut sites: Vec<Site> = Vec::new();
        for site in records.iter().filter_map(normalize_site) {
            if !sites.iter().any(|s| s.id == site.id) {
                sites.push(site);
            }
        }
        sites.sort_by(|a, b| compare_codes(&a.id, &b.id));
        Ok(sites)
    }

    /// Refresh the selector list in the dashboard state, keeping the old list on failure.
    pub async fn refresh(&self, state: &RwLock<DashboardState>) {
        match self.list_sites().await {
            Ok(sites) => {
                tracing::debug!("Loaded {} sites", sites.len());
                state.write().await.sites = sites;
            }
            Err(e) => tracing::warn!("Site list fetch failed: {}", e),
        }
    }
}

fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeRepository;
    use serde_json::json;

    #[tokio::test]
    async fn test_sites_sorted_and_deduplicated() {
        let repo = Arc::new(FakeRepository::default());
        let records = json!([
            {"CODIGO": "10", "POBLACION": "Huelva"},
            {"codigo": "2", "nombre": "Sevilla"},
            {"almacen_id": "10"},
            {"nombre": "no id"}
        ]);
        repo.set_sites(Ok(records
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()));

        let service = SiteService::new(repo);
        let sites = service.list_sites().await.unwrap();
        let ids: Vec<&str> = sites.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "10"]);
        assert_eq!(sites[1].name, "Huelva");
    }

    #[tokio::test]
    async fn test_refresh_keeps_old_list_on_failure() {
        let repo = Arc::new(FakeRepository::default());
        repo.set_sites(Err(FetchError::Network("down".to_string())));
        let state = RwLock::new(DashboardState {
            sites: vec![Site::new("A".to_string(), String::new())],
            ..DashboardState::default()
        });

        SiteService::new(repo).refresh(&state).await;
        assert_eq!(state.read().await.sites.len(), 1);
    }
}
