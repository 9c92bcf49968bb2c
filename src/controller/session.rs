use crate::analysis::chain::ResolutionChain;
use crate::analysis::provider::{CommandMetricsProvider, MetricsProvider};
use crate::analysis::scanner::EnvironmentScanner;
use crate::commands::settings::EffectiveSettings;
use crate::controller::cache::SnapshotCache;
use crate::controller::opener::FileOpener;
use crate::controller::state::{lock, ControllerContext, Surface, VisualizationController};
use crate::error::{ProtocolError, SessionError};
use crate::models::message::{Notice, SurfaceMessage};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// Result of asking for the visualization panel.
pub enum PanelOpen {
    Created(Arc<VisualizationController>),
    Revealed(Arc<VisualizationController>),
}

impl PanelOpen {
    pub fn controller(&self) -> &Arc<VisualizationController> {
        match self {
            PanelOpen::Created(controller) | PanelOpen::Revealed(controller) => controller,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, PanelOpen::Created(_))
    }
}

/// Everything one visualization host owns: the resolution chain, the
/// snapshot cache and at most one active panel.
///
/// The cache outlives panels; closing the panel drops only its view state.
pub struct Session {
    context: ControllerContext,
    tick_interval: Duration,
    startup_notice: Option<Notice>,
    panel: Mutex<Option<Arc<VisualizationController>>>,
}

impl Session {
    /// Build a session from settings, reading library roots from the process
    /// environment.
    pub fn from_settings(
        settings: &EffectiveSettings,
        opener: Arc<dyn FileOpener>,
    ) -> Result<Self, SessionError> {
        let scanner = Arc::new(EnvironmentScanner::new(&settings.scanner)?.with_process_env());

        let provider = settings.provider.clone().map(|provider| {
            Arc::new(CommandMetricsProvider::new(provider)) as Arc<dyn MetricsProvider>
        });
        let startup_notice = provider.is_none().then(|| {
            Notice::warning(
                "No contract metrics provider is configured; showing environment or sample data.",
            )
        });

        let chain = Arc::new(ResolutionChain::standard(provider, Arc::clone(&scanner)));
        let mut session = Self::new(chain, scanner, opener, settings.viewport());
        session.tick_interval = settings.layout.tick_interval;
        session.startup_notice = startup_notice;
        Ok(session)
    }

    pub fn new(
        chain: Arc<ResolutionChain>,
        scanner: Arc<EnvironmentScanner>,
        opener: Arc<dyn FileOpener>,
        viewport: (f64, f64),
    ) -> Self {
        Self {
            context: ControllerContext {
                chain,
                cache: Arc::new(Mutex::new(SnapshotCache::default())),
                scanner,
                opener,
                viewport,
            },
            tick_interval: Duration::from_millis(16),
            startup_notice: None,
            panel: Mutex::new(None),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.context.viewport
    }

    pub fn chain(&self) -> &Arc<ResolutionChain> {
        &self.context.chain
    }

    pub fn cache(&self) -> &Arc<Mutex<SnapshotCache>> {
        &self.context.cache
    }

    pub fn active_panel(&self) -> Option<Arc<VisualizationController>> {
        lock(&self.panel).clone()
    }

    /// Return the existing panel, or create one with a surface from
    /// `make_surface`. Only one panel exists at a time.
    pub fn try_open_panel<F>(&self, make_surface: F) -> Result<PanelOpen, SessionError>
    where
        F: FnOnce(Uuid) -> Result<Arc<dyn Surface>, SessionError>,
    {
        let mut panel = lock(&self.panel);
        if let Some(existing) = panel.as_ref() {
            log::info!("Revealing existing visualization panel {}", existing.id());
            return Ok(PanelOpen::Revealed(Arc::clone(existing)));
        }

        let id = Uuid::new_v4();
        let surface = make_surface(id)?;
        let controller = Arc::new(VisualizationController::new(
            id,
            surface,
            self.context.clone(),
        ));
        if let Some(notice) = &self.startup_notice {
            controller.queue_notice(notice.clone());
        }

        log::info!("Created visualization panel {id}");
        *panel = Some(Arc::clone(&controller));
        Ok(PanelOpen::Created(controller))
    }

    pub fn open_panel(&self, surface: Arc<dyn Surface>) -> Result<PanelOpen, SessionError> {
        self.try_open_panel(move |_| Ok(surface))
    }

    /// Discard the panel with `id`. A newer panel is left alone.
    pub fn dispose_panel(&self, id: Uuid) -> bool {
        let mut panel = lock(&self.panel);
        if !panel.as_ref().is_some_and(|existing| existing.id() == id) {
            return false;
        }
        if let Some(existing) = panel.take() {
            existing.dispose();
        }
        log::info!("Disposed visualization panel {id}");
        true
    }

    /// Decode and dispatch a raw message from the surface.
    pub async fn dispatch(&self, raw: Value) -> Result<(), ProtocolError> {
        let message = SurfaceMessage::parse(raw).map_err(|e| {
            log::warn!("Rejected surface message: {e}");
            e
        })?;
        let controller = self.active_panel().ok_or(ProtocolError::NoActivePanel)?;
        controller.handle(message).await;
        Ok(())
    }
}
