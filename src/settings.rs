use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub index: u32,
    pub resolution: (u32, u32),
    pub fps: u32,
    pub idle_resolution: (u32, u32),
    pub idle_frame_skip: u32,
    pub warmup_frames: u32,
    pub mirror: bool,
    /// Directory of still images replayed instead of a live device.
    pub frames_dir: Option<String>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            resolution: (960, 540),
            fps: 30,
            idle_resolution: (640, 360),
            idle_frame_skip: 2,
            warmup_frames: 12,
            mirror: true,
            frames_dir: None,
        }
    }
}

/// Smoothing and threshold values consumed by the gesture classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub smoothing_alpha: f64,
    pub click_threshold: f64,
    /// Accepted for compatibility; drag release follows `click_threshold`.
    pub drag_threshold: f64,
    pub scroll_threshold: f64,
    pub debounce_ms: u64,
    /// Accepted for compatibility; the idle hint follows the first missing hand.
    pub idle_timeout_sec: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.25,
            click_threshold: 0.035,
            drag_threshold: 0.04,
            scroll_threshold: 0.12,
            debounce_ms: 180,
            idle_timeout_sec: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub auto_start: bool,
    pub activation_hotkey: String,
    /// Seconds without a hand before a session ends; 0 disables the timeout.
    pub max_inactive_seconds: f64,
    /// External landmark helper: program followed by its arguments.
    pub detector_command: Option<Vec<String>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            activation_hotkey: "ctrl+alt+m".into(),
            max_inactive_seconds: 10.0,
            detector_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_to_file: bool,
    pub filepath: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".into(),
            log_to_file: false,
            filepath: None,
        }
    }
}

/// Root configuration, built once at startup and handed to each component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraConfig,
    pub gesture: GestureConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Defaults, then the optional JSON file, then `VM_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    pub fn override_logging_level(&mut self, level: &str) {
        self.logging.level = level.to_uppercase();
    }

    /// Applies overrides from `lookup`; values that fail to parse keep the current setting.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let camera = &mut self.camera;
        camera.index = env_parse(&lookup, "VM_CAMERA_INDEX", camera.index);
        camera.resolution = env_resolution(&lookup, "VM_CAMERA_RESOLUTION", camera.resolution);
        camera.fps = env_parse(&lookup, "VM_CAMERA_FPS", camera.fps);
        camera.idle_resolution =
            env_resolution(&lookup, "VM_CAMERA_IDLE_RESOLUTION", camera.idle_resolution);
        camera.idle_frame_skip = env_parse(&lookup, "VM_CAMERA_IDLE_SKIP", camera.idle_frame_skip);
        camera.warmup_frames = env_parse(&lookup, "VM_CAMERA_WARMUP_FRAMES", camera.warmup_frames);
        camera.mirror = env_flag(&lookup, "VM_CAMERA_MIRROR", camera.mirror);
        if let Some(dir) = lookup("VM_CAMERA_FRAMES_DIR") {
            camera.frames_dir = Some(dir);
        }

        let gesture = &mut self.gesture;
        gesture.smoothing_alpha =
            env_parse(&lookup, "VM_GESTURE_SMOOTHING", gesture.smoothing_alpha);
        gesture.click_threshold =
            env_parse(&lookup, "VM_GESTURE_CLICK_THRESHOLD", gesture.click_threshold);
        gesture.drag_threshold =
            env_parse(&lookup, "VM_GESTURE_DRAG_THRESHOLD", gesture.drag_threshold);
        gesture.scroll_threshold =
            env_parse(&lookup, "VM_GESTURE_SCROLL_THRESHOLD", gesture.scroll_threshold);
        gesture.debounce_ms = env_parse(&lookup, "VM_GESTURE_DEBOUNCE_MS", gesture.debounce_ms);
        gesture.idle_timeout_sec =
            env_parse(&lookup, "VM_GESTURE_IDLE_TIMEOUT", gesture.idle_timeout_sec);

        let app = &mut self.app;
        app.auto_start = env_flag(&lookup, "VM_APP_AUTO_START", app.auto_start);
        if let Some(hotkey) = lookup("VM_APP_ACTIVATION_HOTKEY") {
            app.activation_hotkey = hotkey;
        }
        app.max_inactive_seconds =
            env_parse(&lookup, "VM_APP_MAX_INACTIVE_SECONDS", app.max_inactive_seconds);
        if let Some(command) = lookup("VM_APP_DETECTOR_COMMAND") {
            let parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                app.detector_command = Some(parts);
            }
        }

        let logging = &mut self.logging;
        if let Some(level) = lookup("VM_LOG_LEVEL") {
            logging.level = level.to_uppercase();
        }
        logging.log_to_file = env_flag(&lookup, "VM_LOG_TO_FILE", logging.log_to_file);
        if let Some(path) = lookup("VM_LOG_PATH") {
            logging.filepath = Some(path);
        }
    }
}

fn env_parse<F, T>(lookup: &F, name: &str, current: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(current)
}

fn env_flag<F>(lookup: &F, name: &str, current: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        None => current,
    }
}

fn env_resolution<F>(lookup: &F, name: &str, current: (u32, u32)) -> (u32, u32)
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name) else {
        return current;
    };
    let Some((width, height)) = raw.split_once('x') else {
        return current;
    };
    match (width.trim().parse(), height.trim().parse()) {
        (Ok(width), Ok(height)) => (width, height),
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.gesture.smoothing_alpha, 0.25);
        assert_eq!(config.gesture.click_threshold, 0.035);
        assert_eq!(config.gesture.scroll_threshold, 0.12);
        assert_eq!(config.gesture.debounce_ms, 180);
        assert_eq!(config.app.max_inactive_seconds, 10.0);
        assert_eq!(config.camera.resolution, (960, 540));
    }

    #[test]
    fn env_overrides_replace_parsed_values() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[
            ("VM_GESTURE_SMOOTHING", "0.5"),
            ("VM_GESTURE_DEBOUNCE_MS", "250"),
            ("VM_CAMERA_RESOLUTION", "1280x720"),
            ("VM_CAMERA_MIRROR", "off"),
            ("VM_APP_AUTO_START", "yes"),
            ("VM_APP_DETECTOR_COMMAND", "python3 hand_detect.py"),
            ("VM_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.gesture.smoothing_alpha, 0.5);
        assert_eq!(config.gesture.debounce_ms, 250);
        assert_eq!(config.camera.resolution, (1280, 720));
        assert!(!config.camera.mirror);
        assert!(config.app.auto_start);
        assert_eq!(
            config.app.detector_command,
            Some(vec!["python3".to_string(), "hand_detect.py".to_string()])
        );
        assert_eq!(config.logging.level, "DEBUG");
    }

    #[test]
    fn unparseable_env_values_keep_current_setting() {
        let mut config = Config::default();
        config.apply_env(lookup_from(&[
            ("VM_GESTURE_CLICK_THRESHOLD", "tight"),
            ("VM_CAMERA_IDLE_RESOLUTION", "640by360"),
            ("VM_CAMERA_FPS", "-3"),
        ]));

        assert_eq!(config.gesture.click_threshold, 0.035);
        assert_eq!(config.camera.idle_resolution, (640, 360));
        assert_eq!(config.camera.fps, 30);
    }

    #[test]
    fn partial_file_fills_missing_sections_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "gesture": { "debounce_ms": 90 } }"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.gesture.debounce_ms, 90);
        assert_eq!(config.gesture.smoothing_alpha, 0.25);
        assert_eq!(config.app.activation_hotkey, "ctrl+alt+m");
    }

    #[test]
    fn persisted_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut config = Config::default();
        config.app.max_inactive_seconds = 3.5;
        config.persist(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.app.max_inactive_seconds, 3.5);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.camera.fps, 30);
    }
}
