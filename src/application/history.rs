// History panel - Archived readings for the selected tank
use crate::application::error::FetchError;
use crate::application::tank_repository::TankRepository;
use crate::domain::normalize::normalize_history;
use crate::domain::reading::HistoricalReading;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// How many of the newest readings are searched for a usable value.
const LATEST_WINDOW: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PanelStatus {
    Loading,
    Loaded,
    Failed(String),
}

/// Newest non-null value of each measurement within the latest readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestValues {
    pub volume_liters: Option<f64>,
    pub volume_15c_liters: Option<f64>,
    pub temperature_c: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPanel {
    pub site_id: String,
    pub tank_id: String,
    pub status: PanelStatus,
    pub readings: Vec<HistoricalReading>,
    pub latest: LatestValues,
    /// Newest minus oldest measured volume over the loaded readings.
    pub trend_liters: Option<f64>,
    /// Selection this panel belongs to; responses for other tickets are dropped.
    #[serde(skip)]
    pub(crate) ticket: u64,
}

impl HistoryPanel {
    fn loading(site_id: &str, tank_id: &str, ticket: u64) -> Self {
        Self {
            site_id: site_id.to_string(),
            tank_id: tank_id.to_string(),
            status: PanelStatus::Loading,
            readings: Vec::new(),
            latest: LatestValues::default(),
            trend_liters: None,
            ticket,
        }
    }

    fn load(&mut self, mut readings: Vec<HistoricalReading>, limit: usize) {
        // newest first; readings without a usable timestamp go last
        readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        readings.truncate(limit);

        let window = &readings[..readings.len().min(LATEST_WINDOW)];
        self.latest = LatestValues {
            volume_liters: window.iter().find_map(|r| r.volume_liters),
            volume_15c_liters: window.iter().find_map(|r| r.volume_15c_liters),
            temperature_c: window.iter().find_map(|r| r.temperature_c),
        };

        let newest = readings.iter().find_map(|r| r.volume_liters);
        let oldest = readings.iter().rev().find_map(|r| r.volume_liters);
        self.trend_liters = match (newest, oldest) {
            (Some(n), Some(o)) if readings.len() > 1 => Some(n - o),
            _ => None,
        };

        self.readings = readings;
        self.status = PanelStatus::Loaded;
    }
}

#[derive(Debug)]
pub enum HistoryOutcome {
    Applied,
    /// The selection changed while the fetch was in flight; result dropped.
    Stale,
    Failed(FetchError),
}

pub struct HistoryService {
    repository: Arc<dyn TankRepository>,
    limit: usize,
    generation: AtomicU64,
    panel: Mutex<Option<HistoryPanel>>,
}

impl HistoryService {
    pub fn new(repository: Arc<dyn TankRepository>, limit: usize) -> Self {
        Self {
            repository,
            limit,
            generation: AtomicU64::new(0),
            panel: Mutex::new(None),
        }
    }

    /// Select a tank and load its history. Only the latest selection's
    /// response is ever applied to the panel.
    pub async fn open(&self, site_id: &str, tank_id: &str) -> HistoryOutcome {
        let ticket = {
            let mut panel = self.panel.lock().await;
            let ticket = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            *panel = Some(HistoryPanel::loading(site_id, tank_id, ticket));
            ticket
        };

        let result = self
            .repository
            .list_history(site_id, tank_id, self.limit)
            .await;

        let mut guard = self.panel.lock().await;
        let Some(panel) = guard.as_mut().filter(|panel| panel.ticket == ticket) else {
            tracing::debug!(site = site_id, tank = tank_id, "discarding stale history response");
            return HistoryOutcome::Stale;
        };

        match result {
            Ok(records) => {
                let readings = records.iter().map(normalize_history).collect();
                panel.load(readings, self.limit);
                tracing::debug!(
                    "Loaded {} history readings for {}/{}",
                    panel.readings.len(),
                    site_id,
                    tank_id
                );
                HistoryOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("History fetch for {}/{} failed: {}", site_id, tank_id, e);
                panel.status = PanelStatus::Failed(e.user_message().to_string());
                HistoryOutcome::Failed(e)
            }
        }
    }

    /// Close the panel; any fetch still in flight becomes stale.
    pub async fn close(&self) {
        let mut panel = self.panel.lock().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *panel = None;
    }

    pub async fn panel(&self) -> Option<HistoryPanel> {
        self.panel.lock().await.clone()
    }
}
