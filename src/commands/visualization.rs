use crate::commands::settings::EffectiveSettings;
use crate::controller::opener::{ensure_exists, EditorCommandOpener, FileOpener};
use crate::controller::session::{PanelOpen, Session};
use crate::controller::state::{run_layout_loop, Surface};
use crate::error::{FileOpenError, SessionError};
use crate::models::message::{HostMessage, Notice, NoticeLevel};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, Manager, State, WebviewUrl, WebviewWindowBuilder, WindowEvent};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use tauri_plugin_opener::OpenerExt;

pub const PANEL_LABEL: &str = "contract-universe";
pub const HOST_MESSAGE_EVENT: &str = "contractlens://host-message";
const PANEL_TITLE: &str = "Contract Universe";

/// Delivers host messages to the panel webview as Tauri events.
pub struct TauriSurface {
    app: AppHandle,
}

impl Surface for TauriSurface {
    fn post(&self, message: HostMessage) {
        if let Err(e) = self.app.emit_to(PANEL_LABEL, HOST_MESSAGE_EVENT, message) {
            log::warn!("Failed to post message to {PANEL_LABEL}: {e}");
        }
    }

    fn notify(&self, notice: Notice) {
        let kind = match notice.level {
            NoticeLevel::Info => None,
            NoticeLevel::Warning => Some(MessageDialogKind::Warning),
            NoticeLevel::Error => Some(MessageDialogKind::Error),
        };
        if let Some(kind) = kind {
            self.app
                .dialog()
                .message(notice.text.clone())
                .kind(kind)
                .title(PANEL_TITLE)
                .show(|_| {});
        }
        self.post(HostMessage::Notice(notice));
    }
}

/// Opens files with the platform default application.
pub struct SystemOpener {
    app: AppHandle,
}

#[async_trait]
impl FileOpener for SystemOpener {
    async fn open(&self, path: &str, line: u32) -> Result<(), FileOpenError> {
        ensure_exists(path)?;
        self.app
            .opener()
            .open_path(path, None::<&str>)
            .map_err(|e| FileOpenError::Launch(e.to_string()))?;
        log::info!("Opened {path} (line {line} needs an editor command)");
        Ok(())
    }
}

pub fn build_session(app: &AppHandle, settings: &EffectiveSettings) -> Result<Session, SessionError> {
    let opener: Arc<dyn FileOpener> = match &settings.editor_command {
        Some(template) => Arc::new(EditorCommandOpener::new(template.clone())),
        None => Arc::new(SystemOpener { app: app.clone() }),
    };
    Session::from_settings(settings, opener)
}

/// Show the single visualization window, creating it on first use.
pub fn open_or_reveal(app: &AppHandle, session: &Arc<Session>) -> Result<PanelOpen, SessionError> {
    let opened = session.try_open_panel(|id| {
        let (width, height) = session.viewport();
        let window = WebviewWindowBuilder::new(app, PANEL_LABEL, WebviewUrl::App("index.html".into()))
            .title(PANEL_TITLE)
            .inner_size(width, height)
            .build()
            .map_err(|e| SessionError::Panel(e.to_string()))?;

        let disposing = Arc::clone(session);
        window.on_window_event(move |event| {
            if let WindowEvent::Destroyed = event {
                disposing.dispose_panel(id);
            }
        });

        Ok(Arc::new(TauriSurface { app: app.clone() }) as Arc<dyn Surface>)
    })?;

    match &opened {
        PanelOpen::Created(controller) => {
            tauri::async_runtime::spawn(run_layout_loop(
                Arc::downgrade(controller),
                session.tick_interval(),
            ));
        }
        PanelOpen::Revealed(_) => {
            if let Some(window) = app.get_webview_window(PANEL_LABEL) {
                let _ = window.show();
                let _ = window.set_focus();
            }
        }
    }

    Ok(opened)
}

/// Returns `true` when a new panel was created.
#[tauri::command]
pub async fn open_visualization(
    app: AppHandle,
    session: State<'_, Arc<Session>>,
) -> Result<bool, String> {
    open_or_reveal(&app, &session)
        .map(|opened| opened.is_created())
        .map_err(|e| e.to_string())
}

/// Entry point for every message the panel sends to the host.
#[tauri::command]
pub async fn post_message(message: Value, session: State<'_, Arc<Session>>) -> Result<(), String> {
    session.dispatch(message).await.map_err(|e| e.to_string())
}
