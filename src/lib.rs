pub mod analysis;
pub mod client;
pub mod commands;
pub mod error;
pub mod logging;
pub mod models;

#[cfg(feature = "desktop")]
use commands::{
    directory::{get_projects, get_team_members, load_directory},
    settings::{get_settings, load_connection_settings, save_settings},
    tasks::{apply_work_span, get_task_info, get_work_per_days, list_my_tasks},
    AppState,
};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    logging::init_logging();

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let config_dir = app.path().app_config_dir()?;
            let auto_load = load_connection_settings(&config_dir)
                .map(|settings| settings.auto_load_directory)
                .unwrap_or_else(|err| {
                    log::warn!("Could not read settings: {err}");
                    false
                });

            app.manage(AppState::new(config_dir));

            if auto_load {
                let handle = app.handle().clone();
                tauri::async_runtime::spawn(async move {
                    preload_directory(handle).await;
                });
            }
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_directory,
            get_projects,
            get_team_members,
            get_task_info,
            get_work_per_days,
            apply_work_span,
            list_my_tasks,
            get_settings,
            save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(feature = "desktop")]
async fn preload_directory(handle: tauri::AppHandle) {
    use tauri::{Emitter, Manager};

    let state = handle.state::<AppState>();
    let client = match state.client() {
        Ok(client) => client,
        Err(err) => {
            log::warn!("Skipping directory preload: {err}");
            return;
        }
    };

    let result = commands::directory::load_directory_internal(&*client, &state.directory, |progress| {
        let _ = handle.emit("directory_load_progress", progress);
    })
    .await;

    if let Err(err) = result {
        log::warn!("Directory preload failed: {err}");
    }
}
