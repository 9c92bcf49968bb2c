use crate::analysis::provider::ProviderSettings;
use crate::analysis::scanner::ScannerSettings;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_DIR: &str = ".contractlens";
const WORKSPACE_ENV: &str = "CONTRACTLENS_WORKSPACE";

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutSettings {
    pub tick_interval: Duration,
    pub width: f64,
    pub height: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            width: 1200.0,
            height: 800.0,
        }
    }
}

/// Typed view of `settings.json` used to build a session.
#[derive(Debug, Clone, Default)]
pub struct EffectiveSettings {
    pub provider: Option<ProviderSettings>,
    pub scanner: ScannerSettings,
    pub editor_command: Option<String>,
    pub layout: LayoutSettings,
}

impl EffectiveSettings {
    pub fn viewport(&self) -> (f64, f64) {
        (self.layout.width, self.layout.height)
    }
}

#[tauri::command]
pub async fn get_settings(workspace_path: Option<String>) -> Result<Value, String> {
    load_settings_from_disk(&resolve_workspace(workspace_path))
}

#[tauri::command]
pub async fn save_settings(
    workspace_path: Option<String>,
    settings: Value,
) -> Result<Value, String> {
    save_settings_to_disk(&resolve_workspace(workspace_path), settings)
}

/// `CONTRACTLENS_WORKSPACE`, or the current directory.
pub fn workspace_root() -> String {
    std::env::var(WORKSPACE_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            std::env::current_dir()
                .ok()
                .map(|dir| dir.to_string_lossy().to_string())
        })
        .unwrap_or_else(|| ".".to_string())
}

fn resolve_workspace(workspace_path: Option<String>) -> String {
    workspace_path
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(workspace_root)
}

pub fn load_effective_settings(workspace_path: &str) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(workspace_path)?;
    Ok(effective_from_value(&settings))
}

fn effective_from_value(settings: &Value) -> EffectiveSettings {
    let provider_command = str_at(settings, &["provider", "command"])
        .map(str::trim)
        .filter(|command| !command.is_empty());
    let provider = provider_command.map(|command| ProviderSettings {
        command: command.to_string(),
        args: strings_at(settings, &["provider", "args"]),
        timeout: Duration::from_millis(
            u64_at(settings, &["provider", "timeoutMs"]).unwrap_or(10_000),
        ),
    });

    let defaults = ScannerSettings::default();
    let scanner = ScannerSettings {
        env_prefix: str_at(settings, &["scanner", "envPrefix"])
            .map(str::to_string)
            .unwrap_or(defaults.env_prefix),
        file_pattern: str_at(settings, &["scanner", "filePattern"])
            .map(str::to_string)
            .unwrap_or(defaults.file_pattern),
        skip_dirs: settings
            .pointer("/scanner/skipDirs")
            .map(|_| strings_at(settings, &["scanner", "skipDirs"]))
            .unwrap_or(defaults.skip_dirs),
    };

    let editor_command = str_at(settings, &["editor", "command"])
        .map(str::trim)
        .filter(|command| !command.is_empty())
        .map(str::to_string);

    let layout_defaults = LayoutSettings::default();
    let layout = LayoutSettings {
        tick_interval: u64_at(settings, &["layout", "tickIntervalMs"])
            .map(Duration::from_millis)
            .unwrap_or(layout_defaults.tick_interval),
        width: u64_at(settings, &["layout", "width"])
            .map(|w| w as f64)
            .unwrap_or(layout_defaults.width),
        height: u64_at(settings, &["layout", "height"])
            .map(|h| h as f64)
            .unwrap_or(layout_defaults.height),
    };

    EffectiveSettings {
        provider,
        scanner,
        editor_command,
        layout,
    }
}

pub fn load_settings_from_disk(workspace_path: &str) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_settings_dir(workspace_path)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {}: {e}", path.display());
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(workspace_path: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(workspace_path);
    ensure_settings_dir(workspace_path)?;

    let mut merged = load_settings_from_disk(workspace_path).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    log::info!("Saved settings to {}", path.display());
    Ok(migrated)
}

fn settings_path(workspace_path: &str) -> PathBuf {
    Path::new(workspace_path)
        .join(SETTINGS_DIR)
        .join("settings.json")
}

fn ensure_settings_dir(workspace_path: &str) -> Result<(), String> {
    let dir = Path::new(workspace_path).join(SETTINGS_DIR);
    fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create {SETTINGS_DIR} directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_flat_provider_keys(&mut out);
    }

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "provider": {
            "command": "",
            "args": [],
            "timeoutMs": 10000
        },
        "scanner": {
            "envPrefix": "SIMPLE_",
            "filePattern": "*.e",
            "skipDirs": ["EIFGENs", "target", "node_modules", "build", "dist"]
        },
        "editor": {
            "command": ""
        },
        "layout": {
            "tickIntervalMs": 16,
            "width": 1200,
            "height": 800
        }
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
                } else if default_value.is_object() {
                    *existing = default_value.clone();
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

/// Pre-versioned files kept the provider at the top level as
/// `serverPath` / `serverArgs`.
fn migrate_flat_provider_keys(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    let command = obj.remove("serverPath");
    let args = obj.remove("serverArgs");
    if command.is_none() && args.is_none() {
        return;
    }

    let provider = obj
        .entry("provider".to_string())
        .or_insert_with(|| json!({}));
    let Some(provider) = provider.as_object_mut() else {
        return;
    };
    if let Some(command) = command {
        provider.entry("command".to_string()).or_insert(command);
    }
    if let Some(args) = args {
        provider.entry("args".to_string()).or_insert(args);
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    if let Some(provider) = obj.get_mut("provider").and_then(Value::as_object_mut) {
        ensure_string(provider, "command", "");
        ensure_string_list(provider, "args", &[]);
        clamp_u64(provider, "timeoutMs", 500, 120_000, 10_000);
    }

    if let Some(scanner) = obj.get_mut("scanner").and_then(Value::as_object_mut) {
        ensure_non_empty_string(scanner, "envPrefix", "SIMPLE_");
        ensure_non_empty_string(scanner, "filePattern", "*.e");
        ensure_string_list(
            scanner,
            "skipDirs",
            &["EIFGENs", "target", "node_modules", "build", "dist"],
        );
    }

    if let Some(editor) = obj.get_mut("editor").and_then(Value::as_object_mut) {
        ensure_string(editor, "command", "");
    }

    if let Some(layout) = obj.get_mut("layout").and_then(Value::as_object_mut) {
        clamp_u64(layout, "tickIntervalMs", 8, 100, 16);
        clamp_u64(layout, "width", 200, 8000, 1200);
        clamp_u64(layout, "height", 200, 8000, 800);
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_string(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map.get(key).and_then(Value::as_str).unwrap_or(default).to_string();
    map.insert(key.to_string(), json!(value));
}

fn ensure_non_empty_string(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn ensure_string_list(map: &mut Map<String, Value>, key: &str, default: &[&str]) {
    let value: Vec<String> = match map.get(key).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|item| item.to_string()).collect(),
    };
    map.insert(key.to_string(), json!(value));
}

fn at<'a>(settings: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(settings, |value, key| value.get(*key))
}

fn str_at<'a>(settings: &'a Value, keys: &[&str]) -> Option<&'a str> {
    at(settings, keys).and_then(Value::as_str)
}

fn u64_at(settings: &Value, keys: &[&str]) -> Option<u64> {
    at(settings, keys).and_then(Value::as_u64)
}

fn strings_at(settings: &Value, keys: &[&str]) -> Vec<String> {
    at(settings, keys)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
