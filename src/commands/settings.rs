use crate::models::connection::{
    ConnectionSettings, DEFAULT_API_VERSION, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_FILE: &str = "settings.json";
const SUPPORTED_API_VERSIONS: &[&str] = &["2.0", "3.0", "4.0", "4.1", "5.0", "5.1", "6.0", "7.0", "7.1"];

/// Version-0 files stored the connection under environment-style keys.
const LEGACY_KEYS: &[(&str, &str)] = &[
    ("TFS_API_URL", "apiUrl"),
    ("TFS_USERNAME", "username"),
    ("TFS_PASSWORD", "accessToken"),
];

#[cfg(feature = "desktop")]
#[tauri::command]
pub fn get_settings(state: tauri::State<'_, super::AppState>) -> Result<Value, String> {
    load_settings_from_disk(&state.config_dir)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub fn save_settings(
    state: tauri::State<'_, super::AppState>,
    settings: Value,
) -> Result<Value, String> {
    let saved = save_settings_to_disk(&state.config_dir, settings)?;
    state.reset_client();
    Ok(saved)
}

/// Settings file merged with `TFS_API_URL` / `TFS_USERNAME` / `TFS_PASSWORD`.
pub fn load_connection_settings(config_dir: &Path) -> Result<ConnectionSettings, String> {
    let settings = load_settings_from_disk(config_dir)?;
    Ok(connection_settings_from(&settings, |key| std::env::var(key).ok()))
}

pub fn connection_settings_from<F>(settings: &Value, env: F) -> ConnectionSettings
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = ConnectionSettings::default();
    let text = |key: &str| {
        settings
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    let env_or = |var: &str, fallback: String| {
        env(var)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(fallback)
    };

    ConnectionSettings {
        api_url: normalize_api_url(&env_or("TFS_API_URL", text("apiUrl"))),
        username: env_or("TFS_USERNAME", text("username")),
        access_token: env_or("TFS_PASSWORD", text("accessToken")),
        api_version: settings
            .get("apiVersion")
            .and_then(Value::as_str)
            .filter(|v| SUPPORTED_API_VERSIONS.contains(v))
            .map(str::to_string)
            .unwrap_or(defaults.api_version),
        request_timeout_secs: settings
            .get("requestTimeoutSecs")
            .and_then(Value::as_u64)
            .unwrap_or(defaults.request_timeout_secs)
            .clamp(5, 300),
        auto_load_directory: settings
            .get("autoLoadDirectory")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.auto_load_directory),
    }
}

pub fn load_settings_from_disk(config_dir: &Path) -> Result<Value, String> {
    let path = settings_path(config_dir);
    ensure_config_dir(config_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(config_dir: &Path, settings: Value) -> Result<Value, String> {
    let path = settings_path(config_dir);
    ensure_config_dir(config_dir)?;

    let mut merged = load_settings_from_disk(config_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("Saved settings to {}", path.display());
    Ok(migrated)
}

fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

fn ensure_config_dir(config_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(config_dir)
        .map_err(|e| format!("Failed to create config directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_legacy_keys(&mut out);
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "apiUrl": "",
        "username": "",
        "accessToken": "",
        "apiVersion": DEFAULT_API_VERSION,
        "requestTimeoutSecs": DEFAULT_REQUEST_TIMEOUT_SECS,
        "autoLoadDirectory": true
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn migrate_legacy_keys(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    for (legacy, current) in LEGACY_KEYS {
        if let Some(value) = obj.remove(*legacy) {
            obj.entry(current.to_string()).or_insert(value);
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    ensure_string(obj, "apiUrl");
    ensure_string(obj, "username");
    ensure_string(obj, "accessToken");
    if let Some(url) = obj.get("apiUrl").and_then(Value::as_str) {
        let normalized = normalize_api_url(url);
        obj.insert("apiUrl".to_string(), json!(normalized));
    }

    sanitize_enum(obj, "apiVersion", SUPPORTED_API_VERSIONS, DEFAULT_API_VERSION);
    clamp_u64(obj, "requestTimeoutSecs", 5, 300, DEFAULT_REQUEST_TIMEOUT_SECS);
    ensure_bool(obj, "autoLoadDirectory", true);
}

fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn ensure_string(map: &mut Map<String, Value>, key: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}
