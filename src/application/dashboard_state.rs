// Dashboard state - Selection and the outcome of the latest refresh
use crate::domain::reading::Site;
use crate::domain::summary::{DashboardSummary, ProductSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Written by the refresh driver (snapshot results) and by request handlers
/// (selection). The render cache keeps its own handle map.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardState {
    /// `None` shows every site.
    pub selected_site: Option<String>,
    /// Site filter the visible cards were fetched with.
    pub rendered_site: Option<String>,
    pub sites: Vec<Site>,
    pub summary: Option<DashboardSummary>,
    pub products: Vec<ProductSummary>,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub cycles: u64,
}

impl DashboardState {
    pub fn has_data(&self) -> bool {
        self.last_success.is_some()
    }

    /// Returns true when the selection actually changed.
    pub fn select_site(&mut self, site: Option<String>) -> bool {
        let site = site.filter(|s| !s.trim().is_empty());
        if self.selected_site == site {
            return false;
        }
        self.selected_site = site;
        true
    }
}
