use crate::events::AppEvent;
use async_channel::Sender;
use carousel::settings::SettingsError;
use carousel::{CarouselSettings, ImageEntry, ImageSource};
use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub images: Vec<ImageEntry>,
    #[serde(default)]
    pub carousel: CarouselSettings,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid carousel settings: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let s = builder
            .add_source(
                config::Environment::with_prefix("VITRINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.carousel.validate()?;
        Ok(config)
    }

    /// Makes relative image paths relative to `base` instead of the
    /// working directory.
    pub fn resolve_sources(&mut self, base: &Path) {
        for entry in &mut self.images {
            let path = Path::new(entry.src.as_str());
            if path.is_relative() && !entry.src.contains("://") {
                entry.src = ImageSource::new(base.join(path).to_string_lossy());
            }
        }
    }
}

pub fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "vitrine", "vitrine").ok_or(ConfigError::ConfigDirNotFound)
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let mut config = Config::from_builder(
        config::Config::builder().add_source(config::File::from(path).required(false)),
    )?;
    if let Some(dir) = path.parent() {
        config.resolve_sources(dir);
    }
    Ok(config)
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_from(&get_config_path()?)
}

pub fn load_or_setup() -> Config {
    if let Ok(path) = get_config_path()
        && !path.exists()
    {
        match write_default_config() {
            Ok(path) => log::info!("Wrote default config to {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
    }

    load_config().unwrap_or_else(|e| {
        log::error!("Failed to load config, using defaults: {}", e);
        Config::default()
    })
}

pub fn write_default_config() -> std::io::Result<PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Whether `event` changed the config file itself.
fn touches_config(event: &notify::Event, config_path: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| p == config_path)
}

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let Some(config_dir) = config_path.parent().map(Path::to_path_buf) else {
        return;
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) if touches_config(&event, &config_path) => {
                log::debug!("Config file changed: {:?}", event.kind);
                if tx.send(AppEvent::ConfigReload).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carousel::easing::Easing;

    fn parse(toml: &str) -> Result<Config, ConfigError> {
        Config::from_builder(
            config::Config::builder()
                .add_source(config::File::from_str(toml, config::FileFormat::Toml)),
        )
    }

    #[test]
    fn test_default_config_parses() {
        let config = parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.carousel, CarouselSettings::default());
    }

    #[test]
    fn test_images_and_partial_settings() {
        let config = parse(
            r#"
            [[images]]
            src = "a.jpg"
            caption = "First"

            [[images]]
            src = "https://example.org/b.png"

            [carousel]
            friction = 0.9
            snap_easing = "Linear"
            "#,
        )
        .unwrap();

        assert_eq!(config.images.len(), 2);
        assert_eq!(config.images[0].caption.as_str(), "First");
        assert_eq!(config.images[1].caption.as_str(), "");
        assert_eq!(config.carousel.friction, 0.9);
        assert_eq!(config.carousel.snap_easing, Easing::Linear);
        assert_eq!(config.carousel.max_scale, 4.0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = parse("[carousel]\nmin_scale = 3.0\nmax_scale = 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Settings(_)));
    }

    #[test]
    fn test_resolve_sources() {
        let mut config = Config {
            images: vec![
                ImageEntry::new("a.jpg", ""),
                ImageEntry::new("/abs/b.jpg", ""),
                ImageEntry::new("file:///c.jpg", ""),
            ],
            ..Config::default()
        };
        config.resolve_sources(Path::new("/home/me/.config/vitrine"));

        assert_eq!(
            config.images[0].src.as_str(),
            "/home/me/.config/vitrine/a.jpg"
        );
        assert_eq!(config.images[1].src.as_str(), "/abs/b.jpg");
        assert_eq!(config.images[2].src.as_str(), "file:///c.jpg");
    }

    #[test]
    fn test_touches_config() {
        let path = Path::new("/cfg/config.toml");
        let modify = notify::Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
            .add_path(path.to_path_buf());
        let other = notify::Event::new(EventKind::Create(notify::event::CreateKind::File))
            .add_path(PathBuf::from("/cfg/other.toml"));
        let access = notify::Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(path.to_path_buf());

        assert!(touches_config(&modify, path));
        assert!(!touches_config(&other, path));
        assert!(!touches_config(&access, path));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.toml")).unwrap();
        assert!(config.images.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs_err::write(&path, "[[images]]\nsrc = \"pic.png\"\n").unwrap();

        let config = load_from(&path).unwrap();
        assert_eq!(
            config.images[0].src.as_str(),
            dir.path().join("pic.png").to_string_lossy()
        );
    }
}
