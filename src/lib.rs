pub mod analysis;
pub mod commands;
pub mod controller;
pub mod error;
pub mod models;
pub mod view;

use commands::{
    settings::{get_settings, load_effective_settings, save_settings, workspace_root, EffectiveSettings},
    visualization::{build_session, open_or_reveal, open_visualization, post_message},
};
use env_logger::Env;
use std::sync::Arc;
use tauri::Manager;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let workspace = workspace_root();
            let settings = load_effective_settings(&workspace).unwrap_or_else(|e| {
                log::warn!("Using default settings for {workspace}: {e}");
                EffectiveSettings::default()
            });

            let session = Arc::new(build_session(app.handle(), &settings)?);
            app.manage(Arc::clone(&session));
            open_or_reveal(app.handle(), &session)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            open_visualization,
            post_message,
            get_settings,
            save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
