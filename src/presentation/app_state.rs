// Application state for HTTP handlers
use crate::application::dashboard_state::DashboardState;
use crate::application::history::HistoryService;
use crate::application::refresh_driver::RefreshDriver;
use crate::application::render_cache::RenderCache;
use crate::application::sites::SiteService;
use crate::application::tank_repository::TankRepository;
use crate::presentation::html_surface::HtmlSurface;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub struct AppState {
    pub driver: Arc<RefreshDriver<HtmlSurface>>,
    pub cache: Arc<Mutex<RenderCache<HtmlSurface>>>,
    pub dashboard: Arc<RwLock<DashboardState>>,
    pub history: HistoryService,
    pub site_service: SiteService,
    pub refresh_secs: u64,
}

impl AppState {
    /// Wire the services around one repository. The driver is not started.
    pub fn new(
        repository: Arc<dyn TankRepository>,
        interval: Duration,
        use_status_endpoint: bool,
        history_limit: usize,
    ) -> Self {
        let cache = Arc::new(Mutex::new(RenderCache::new(HtmlSurface::new())));
        let dashboard = Arc::new(RwLock::new(DashboardState::default()));
        let driver = Arc::new(RefreshDriver::new(
            repository.clone(),
            cache.clone(),
            dashboard.clone(),
            interval,
            use_status_endpoint,
        ));

        Self {
            driver,
            cache,
            dashboard,
            history: HistoryService::new(repository.clone(), history_limit),
            site_service: SiteService::new(repository),
            refresh_secs: interval.as_secs().max(1),
        }
    }
}
