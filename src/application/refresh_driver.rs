// Refresh driver - Poll, normalize, diff-render, then post-effects
use crate::application::dashboard_state::DashboardState;
use crate::application::error::FetchError;
use crate::application::render_cache::{RenderCache, RenderReport};
use crate::application::surface::{CardSurface, StatusLine};
use crate::application::tank_repository::TankRepository;
use crate::domain::fields::RawRecord;
use crate::domain::normalize::normalize_tank;
use crate::domain::reading::{Snapshot, group_by_site};
use crate::domain::summary::{DashboardSummary, product_summary};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::MissedTickBehavior;

#[derive(Debug)]
pub enum CycleOutcome {
    /// Another cycle was already in flight.
    Skipped,
    Rendered(RenderReport),
    Failed(FetchError),
}

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RefreshDriver<S: CardSurface> {
    repository: Arc<dyn TankRepository>,
    cache: Arc<Mutex<RenderCache<S>>>,
    state: Arc<RwLock<DashboardState>>,
    interval: Duration,
    use_status_endpoint: bool,
    in_flight: AtomicBool,
    rerun: AtomicBool,
}

impl<S: CardSurface> RefreshDriver<S> {
    pub fn new(
        repository: Arc<dyn TankRepository>,
        cache: Arc<Mutex<RenderCache<S>>>,
        state: Arc<RwLock<DashboardState>>,
        interval: Duration,
        use_status_endpoint: bool,
    ) -> Self {
        Self {
            repository,
            cache,
            state,
            interval,
            use_status_endpoint,
            in_flight: AtomicBool::new(false),
            rerun: AtomicBool::new(false),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Timer entry point. A no-op while another cycle is in flight.
    pub async fn refresh_cycle(&self) -> CycleOutcome {
        let mut outcome = CycleOutcome::Skipped;
        loop {
            let Some(guard) = InFlightGuard::acquire(&self.in_flight) else {
                tracing::debug!("refresh already in flight, skipping");
                return outcome;
            };
            self.rerun.store(false, Ordering::Release);
            outcome = self.run_pipeline().await;
            drop(guard);

            if !self.rerun.load(Ordering::Acquire) {
                return outcome;
            }
            tracing::debug!("rerunning refresh requested during the last cycle");
        }
    }

    /// Manual or selection-driven refresh. If a cycle is in flight, another one
    /// runs as soon as it finishes so the newest selection is always fetched.
    pub async fn request_refresh(&self) -> CycleOutcome {
        self.rerun.store(true, Ordering::Release);
        self.refresh_cycle().await
    }

    /// Poll forever on the configured interval.
    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!("Polling tank backend every {}s", self.interval.as_secs());

        loop {
            ticker.tick().await;
            if !self.should_poll().await {
                continue;
            }
            match self.refresh_cycle().await {
                CycleOutcome::Failed(e) => tracing::warn!("Refresh failed: {}", e),
                CycleOutcome::Rendered(report) if !report.failures.is_empty() => {
                    tracing::warn!("{} cards failed to render", report.failures.len())
                }
                _ => {}
            }
        }
    }

    /// Ask the status endpoint first when enabled; anything but an explicit
    /// "no changes" after a good render means refresh.
    async fn should_poll(&self) -> bool {
        if !self.use_status_endpoint || !self.state.read().await.has_data() {
            return true;
        }
        match self.repository.changes_detected().await {
            Ok(Some(false)) => {
                tracing::debug!("Backend reports no changes, skipping refresh");
                false
            }
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Status check failed ({}), refreshing anyway", e);
                true
            }
        }
    }

    async fn run_pipeline(&self) -> CycleOutcome {
        let site = self.state.read().await.selected_site.clone();

        let records = match self.fetch(site.as_deref()).await {
            Ok(records) => records,
            Err(e) => {
                self.record_failure(&e).await;
                return CycleOutcome::Failed(e);
            }
        };

        let snapshot = Self::normalize(records);
        let report = self.render(&snapshot).await;
        self.post_effects(&snapshot, site).await;
        CycleOutcome::Rendered(report)
    }

    async fn fetch(&self, site: Option<&str>) -> Result<Vec<RawRecord>, FetchError> {
        tracing::debug!("Fetching tanks for site {:?}", site);
        self.repository.list_tanks(site).await
    }

    fn normalize(records: Vec<RawRecord>) -> Snapshot {
        let readings = records.iter().map(normalize_tank).collect();
        Snapshot::new(group_by_site(readings))
    }

    async fn render(&self, snapshot: &Snapshot) -> RenderReport {
        let summary = DashboardSummary::from_readings(snapshot.tanks());
        let mut cache = self.cache.lock().await;
        let report = cache.render_all(&snapshot.groups);
        cache.set_status(&StatusLine::Ready {
            summary: summary.text(),
            refreshed_at: snapshot.fetched_at,
        });
        report
    }

    async fn post_effects(&self, snapshot: &Snapshot, site: Option<String>) {
        let mut state = self.state.write().await;
        state.rendered_site = site;
        state.summary = Some(DashboardSummary::from_readings(snapshot.tanks()));
        state.products = product_summary(snapshot.tanks());
        state.last_success = Some(snapshot.fetched_at);
        state.last_error = None;
        state.cycles += 1;
        tracing::info!(
            "Refreshed {} tanks across {} sites",
            snapshot.tanks().count(),
            snapshot.groups.len()
        );
    }

    /// Keep the cards; only the status line reports the failure.
    async fn record_failure(&self, error: &FetchError) {
        tracing::warn!("Tank refresh failed: {}", error);
        let last_success = {
            let mut state = self.state.write().await;
            state.last_error = Some(error.user_message().to_string());
            state.cycles += 1;
            state.last_success
        };
        self.cache.lock().await.set_status(&StatusLine::Failed {
            message: error.user_message().to_string(),
            last_success,
        });
    }
}
