// In-memory repository for application tests
use crate::application::error::FetchError;
use crate::application::tank_repository::TankRepository;
use crate::domain::fields::RawRecord;
use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

pub fn tank_record(site: &str, tank: &str, volume: f64, capacity: f64) -> RawRecord {
    json!({
        "almacen": site,
        "tanque": tank,
        "tanque_nombre": format!("Tanque {}", tank),
        "producto": "GOA",
        "producto_nombre": "GASOLEO A",
        "capacidad": capacity,
        "volumen": volume,
        "temperatura": 18.0
    })
    .as_object()
    .cloned()
    .unwrap()
}

pub fn history_record(timestamp: &str, liters: Option<f64>, temperature: Option<f64>) -> RawRecord {
    json!({
        "dt": timestamp,
        "litros": liters,
        "litros15": liters.map(|l| l - 10.0),
        "temperatura": temperature
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[derive(Default)]
pub struct FakeRepository {
    tanks: Mutex<VecDeque<Result<Vec<RawRecord>, FetchError>>>,
    sites: Mutex<Option<Result<Vec<RawRecord>, FetchError>>>,
    history: Mutex<HashMap<String, Result<Vec<RawRecord>, FetchError>>>,
    changes: Mutex<Option<Result<Option<bool>, FetchError>>>,
    last_site: Mutex<Option<String>>,
    gate: Option<Semaphore>,
    gated_tanks: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl FakeRepository {
    /// Every tank-list call waits for a `release`.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// History calls for these tanks wait for a `release`.
    pub fn gated_history(tanks: &[&str]) -> Self {
        let repo = Self::gated();
        *repo.gated_tanks.lock().unwrap() = tanks.iter().map(|t| t.to_string()).collect();
        repo
    }

    pub fn push_tanks(&self, response: Result<Vec<RawRecord>, FetchError>) {
        self.tanks.lock().unwrap().push_back(response);
    }

    pub fn set_sites(&self, response: Result<Vec<RawRecord>, FetchError>) {
        *self.sites.lock().unwrap() = Some(response);
    }

    pub fn set_history(&self, tank: &str, response: Result<Vec<RawRecord>, FetchError>) {
        self.history.lock().unwrap().insert(tank.to_string(), response);
    }

    pub fn set_changes(&self, response: Result<Option<bool>, FetchError>) {
        *self.changes.lock().unwrap() = Some(response);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn tank_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_site_filter(&self) -> Option<String> {
        self.last_site.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls.load(Ordering::SeqCst) < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

#[async_trait]
impl TankRepository for FakeRepository {
    async fn list_sites(&self) -> Result<Vec<RawRecord>, FetchError> {
        self.sites.lock().unwrap().clone().unwrap_or_else(|| Ok(vec![]))
    }

    async fn list_tanks(&self, site: Option<&str>) -> Result<Vec<RawRecord>, FetchError> {
        *self.last_site.lock().unwrap() = site.map(str::to_string);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;
        self.tanks.lock().unwrap().pop_front().unwrap_or_else(|| Ok(vec![]))
    }

    async fn list_history(
        &self,
        _site: &str,
        tank: &str,
        _limit: usize,
    ) -> Result<Vec<RawRecord>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gated = self.gated_tanks.lock().unwrap().iter().any(|t| t == tank);
        if gated {
            self.pass_gate().await;
        }
        self.history
            .lock()
            .unwrap()
            .get(tank)
            .cloned()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn changes_detected(&self) -> Result<Option<bool>, FetchError> {
        self.changes.lock().unwrap().clone().unwrap_or(Ok(None))
    }
}
