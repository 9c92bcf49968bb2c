use crate::analysis::chain::ResolutionChain;
use crate::analysis::scanner::EnvironmentScanner;
use crate::controller::cache::{lookup_library, DrillDownHit, SnapshotCache};
use crate::controller::opener::FileOpener;
use crate::error::FileOpenError;
use crate::models::graph::GraphView;
use crate::models::message::{HostMessage, LibraryDetail, Notice, SurfaceMessage};
use crate::models::snapshot::{Library, Snapshot};
use crate::view::layout::Simulation;
use crate::view::render;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_UNIVERSE_NAME: &str = "Contract Universe";

/// Receives everything the controller pushes to the rendering surface.
pub trait Surface: Send + Sync {
    fn post(&self, message: HostMessage);

    /// Show a notice to the user.
    fn notify(&self, notice: Notice);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Universe,
    Library { selected: String },
}

/// Shared collaborators a controller works against.
#[derive(Clone)]
pub struct ControllerContext {
    pub chain: Arc<ResolutionChain>,
    pub cache: Arc<Mutex<SnapshotCache>>,
    pub scanner: Arc<EnvironmentScanner>,
    pub opener: Arc<dyn FileOpener>,
    pub viewport: (f64, f64),
}

/// Owns the view state of one visualization panel.
pub struct VisualizationController {
    id: Uuid,
    surface: Arc<dyn Surface>,
    context: ControllerContext,
    state: Mutex<ViewState>,
    viewport: Mutex<(f64, f64)>,
    layout: Mutex<Option<Simulation>>,
    pending_notices: Mutex<Vec<Notice>>,
    disposed: AtomicBool,
}

impl VisualizationController {
    pub fn new(id: Uuid, surface: Arc<dyn Surface>, context: ControllerContext) -> Self {
        let viewport = context.viewport;
        Self {
            id,
            surface,
            context,
            state: Mutex::new(ViewState::Universe),
            viewport: Mutex::new(viewport),
            layout: Mutex::new(None),
            pending_notices: Mutex::new(Vec::new()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ViewState {
        lock(&self.state).clone()
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    /// Hold a notice until the surface has asked for data, so it is
    /// listening when the notice arrives.
    pub fn queue_notice(&self, notice: Notice) {
        lock(&self.pending_notices).push(notice);
    }

    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        lock(&self.layout).take();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub async fn handle(&self, message: SurfaceMessage) {
        match message {
            SurfaceMessage::RequestData => {
                self.request_data().await;
            }
            SurfaceMessage::DrillDown { library_name } => {
                self.drill_down(&library_name);
            }
            SurfaceMessage::ShowUniverse => {
                self.show_universe().await;
            }
            SurfaceMessage::OpenFile { file_path, line } => {
                // Failures are already reported to the user.
                let _ = self.open_file(&file_path, line).await;
            }
            SurfaceMessage::DragStart { node_id, x, y } => {
                self.with_layout(|sim| sim.drag_start(&node_id, x, y));
            }
            SurfaceMessage::DragMove { node_id, x, y } => {
                self.with_layout(|sim| sim.drag_move(&node_id, x, y));
            }
            SurfaceMessage::DragEnd { node_id } => {
                self.with_layout(|sim| sim.drag_end(&node_id));
            }
            SurfaceMessage::Resize { width, height } => {
                *lock(&self.viewport) = (width, height);
                self.with_layout(|sim| {
                    sim.resize(width, height);
                    true
                });
            }
        }
    }

    /// Run the resolution chain, replace the cache and show the universe.
    ///
    /// Concurrent calls are not serialized; whichever resolves last owns the
    /// cache and the view.
    pub async fn request_data(&self) -> Arc<Snapshot> {
        let snapshot = self.context.chain.resolve().await;
        let snapshot = lock(&self.context.cache).set(snapshot);
        self.render_universe(&snapshot);
        self.flush_notices();
        snapshot
    }

    /// Switch to a library. On a miss the current view is kept and the
    /// surface receives an empty `showLibrary`.
    pub fn drill_down(&self, library_name: &str) -> Option<Library> {
        let cached = lock(&self.context.cache).get();
        let hit = lookup_library(cached.as_deref(), library_name, &self.context.scanner);

        let Some(hit) = hit else {
            log::warn!("Drill-down miss for library {library_name}");
            self.surface.post(HostMessage::ShowLibrary {
                data: None,
                graph: None,
            });
            return None;
        };

        if let DrillDownHit::Scanned(_) = hit {
            log::info!("Library {library_name} not cached, scanned from environment");
        }
        let library = hit.into_library();
        let universe_name = cached
            .as_ref()
            .map(|snapshot| snapshot.name.as_str())
            .unwrap_or(DEFAULT_UNIVERSE_NAME);

        let (width, height) = *lock(&self.viewport);
        let graph = render::library_view(universe_name, &library, width, height);
        self.restart_layout(&graph);
        *lock(&self.state) = ViewState::Library {
            selected: library.name.clone(),
        };
        log::info!("Showing library {}", library.name);

        self.surface.post(HostMessage::ShowLibrary {
            data: Some(LibraryDetail::from(&library)),
            graph: Some(graph),
        });
        Some(library)
    }

    /// Back to the universe from the cache, or a fresh fetch when empty.
    pub async fn show_universe(&self) {
        let cached = lock(&self.context.cache).get();
        match cached {
            Some(snapshot) => self.render_universe(&snapshot),
            None => {
                self.request_data().await;
            }
        }
    }

    pub async fn open_file(&self, path: &str, line: u32) -> Result<(), FileOpenError> {
        let result = self.context.opener.open(path, line).await;
        if let Err(e) = &result {
            log::warn!("Failed to open {path}:{line}: {e}");
            self.surface
                .notify(Notice::error(format!("Could not open {path}: {e}")));
        }
        result
    }

    /// Advance the layout one tick and publish positions.
    /// Returns `false` when there is nothing left to animate.
    pub fn step_layout(&self) -> bool {
        let positions = {
            let mut layout = lock(&self.layout);
            match layout.as_mut() {
                Some(sim) if !sim.is_settled() => {
                    sim.tick();
                    sim.positions()
                }
                _ => return false,
            }
        };

        self.surface.post(HostMessage::LayoutTick { positions });
        true
    }

    pub fn layout_snapshot(&self) -> Option<Simulation> {
        lock(&self.layout).clone()
    }

    fn render_universe(&self, snapshot: &Arc<Snapshot>) {
        let (width, height) = *lock(&self.viewport);
        let graph = render::universe_view(snapshot, width, height);
        self.restart_layout(&graph);
        *lock(&self.state) = ViewState::Universe;

        self.surface.post(HostMessage::UpdateData {
            data: Arc::clone(snapshot),
            graph,
        });
    }

    fn flush_notices(&self) {
        let pending = std::mem::take(&mut *lock(&self.pending_notices));
        for notice in pending {
            self.surface.notify(notice);
        }
    }

    fn restart_layout(&self, graph: &GraphView) {
        *lock(&self.layout) = Some(Simulation::from_view(graph));
    }

    fn with_layout<F>(&self, action: F)
    where
        F: FnOnce(&mut Simulation) -> bool,
    {
        if let Some(sim) = lock(&self.layout).as_mut() {
            if !action(sim) {
                log::debug!("Layout action ignored for unknown node");
            }
        }
    }
}

/// Tick loop for a panel's layout. Runs until the controller is dropped or
/// disposed; data fetches never block it because it only touches the
/// simulation slot.
pub async fn run_layout_loop(controller: Weak<VisualizationController>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        let Some(controller) = controller.upgrade() else {
            break;
        };
        if controller.is_disposed() {
            break;
        }
        controller.step_layout();
    }
    log::debug!("Layout loop stopped");
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
