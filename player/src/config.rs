//! Configuration management (`cardhost.toml`)
//!
//! Settings are stored in TOML in the platform configuration directory, or
//! loaded from an explicit `--config` path. Every field has a default, so a
//! partial or empty file is valid.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Configuration file name inside the config directory
pub const CONFIG_FILE: &str = "cardhost.toml";

/// Player configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Engine module settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Path to the engine `.wasm` (default: `solitaire.wasm`)
    #[serde(default = "default_module_path")]
    pub path: PathBuf,
    /// Linear memory limit in MiB (default: 64)
    #[serde(default = "default_ram_limit_mb")]
    pub ram_limit_mb: usize,
    /// Fixed seed for `get_random_u32`; random per run if unset
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Windowed surface width (default: 800)
    #[serde(default = "default_width")]
    pub width: u32,
    /// Windowed surface height (default: 600)
    #[serde(default = "default_height")]
    pub height: u32,
    /// Enter fullscreen after startup (default: false)
    #[serde(default)]
    pub fullscreen: bool,
    /// Wait for vertical sync (default: true)
    #[serde(default = "default_true")]
    pub vsync: bool,
    #[serde(default = "default_title")]
    pub title: String,
}

/// One named sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    /// WAV file, relative to the module's directory unless absolute
    pub path: PathBuf,
    /// Playback speed multiplier (default: 1.0)
    #[serde(default = "default_playback_rate")]
    pub playback_rate: f32,
}

/// Audio settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Master volume level (default: 0.8, range: 0.0-1.0)
    #[serde(default = "default_volume")]
    pub master_volume: f32,
    /// Sound names the engine may trigger (default: `win`, `card`)
    #[serde(default = "default_sounds")]
    pub sounds: HashMap<String, SoundConfig>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter used when `RUST_LOG` is unset (default: `info`)
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_module_path() -> PathBuf {
    PathBuf::from("solitaire.wasm")
}
fn default_ram_limit_mb() -> usize {
    64
}
fn default_width() -> u32 {
    800
}
fn default_height() -> u32 {
    600
}
fn default_true() -> bool {
    true
}
fn default_title() -> String {
    "Solitaire".to_string()
}
fn default_playback_rate() -> f32 {
    1.0
}
fn default_volume() -> f32 {
    0.8
}
fn default_log_filter() -> String {
    "info".to_string()
}

fn default_sounds() -> HashMap<String, SoundConfig> {
    let mut sounds = HashMap::new();
    sounds.insert(
        "win".to_string(),
        SoundConfig {
            path: PathBuf::from("audio/Victory SoundFX5.wav"),
            playback_rate: 1.0,
        },
    );
    sounds.insert(
        "card".to_string(),
        SoundConfig {
            path: PathBuf::from("audio/cardSlide1.wav"),
            playback_rate: 1.5,
        },
    );
    sounds
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            path: default_module_path(),
            ram_limit_mb: default_ram_limit_mb(),
            seed: None,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fullscreen: false,
            vsync: default_true(),
            title: default_title(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: default_volume(),
            sounds: default_sounds(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl ModuleConfig {
    pub fn ram_limit_bytes(&self) -> usize {
        self.ram_limit_mb.saturating_mul(1024 * 1024)
    }

    /// Directory sound paths are resolved against
    pub fn asset_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/cardhost`
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "cardhost", "cardhost")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Load configuration from `path`
///
/// A missing file yields defaults; an unreadable or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config at {}; using defaults", path.display());
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load configuration from `path`, writing the defaults there on first run
pub fn load_or_create(path: &Path) -> Result<Config> {
    if path.exists() {
        return load_from(path);
    }
    let config = Config::default();
    match save_to(&config, path) {
        Ok(()) => tracing::info!("Wrote default config to {}", path.display()),
        Err(e) => tracing::warn!("Could not write default config: {:#}", e),
    }
    Ok(config)
}

/// Load the explicit config if given, else the one in the config directory
///
/// Problems with the platform file are logged and fall back to defaults;
/// problems with an explicit file are errors.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_from(path);
    }
    let Some(dir) = config_dir() else {
        return Ok(Config::default());
    };
    match load_or_create(&dir.join(CONFIG_FILE)) {
        Ok(config) => Ok(config),
        Err(e) => {
            tracing::warn!("Ignoring config file: {:#}", e);
            Ok(Config::default())
        }
    }
}

/// Write `config` to `path`, creating parent directories
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!((config.video.width, config.video.height), (800, 600));
        assert!(!config.video.fullscreen);
        assert!(config.video.vsync);
        assert_eq!(config.module.ram_limit_bytes(), 64 * 1024 * 1024);
        assert!((config.audio.master_volume - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_default_sounds() {
        let sounds = Config::default().audio.sounds;
        assert_eq!(sounds.len(), 2);
        assert_eq!(sounds["win"].path, PathBuf::from("audio/Victory SoundFX5.wav"));
        assert!((sounds["card"].playback_rate - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_deserialize_partial_video() {
        let toml_str = r#"
[video]
fullscreen = true
width = 1024
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.video.fullscreen);
        assert_eq!(config.video.width, 1024);
        assert_eq!(config.video.height, 600); // default
        assert!(config.video.vsync); // default
    }

    #[test]
    fn test_sound_table_replaces_defaults() {
        let toml_str = r#"
[audio.sounds.shuffle]
path = "audio/shuffle.wav"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        let sounds = &config.audio.sounds;
        assert_eq!(sounds.len(), 1);
        assert!((sounds["shuffle"].playback_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let mut config = Config::default();
        config.module.seed = Some(99);
        config.video.title = "Klondike".to_string();
        config.audio.master_volume = 0.5;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_asset_dir() {
        let module = ModuleConfig {
            path: PathBuf::from("games/solitaire/engine.wasm"),
            ..ModuleConfig::default()
        };
        assert_eq!(module.asset_dir(), PathBuf::from("games/solitaire"));
        assert_eq!(ModuleConfig::default().asset_dir(), PathBuf::new());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[video\nwidth = ").unwrap();

        assert!(load_from(&path).is_err());
        assert!(load(Some(&path)).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = Config::default();
        config.video.height = 720;

        save_to(&config, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = load_or_create(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // The written file is read back on the next run, edits included
        let mut edited = load_from(&path).unwrap();
        edited.video.width = 1280;
        save_to(&edited, &path).unwrap();
        assert_eq!(load_or_create(&path).unwrap().video.width, 1280);
    }
}
