use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub window: WindowConfig,
    pub bindings: BindingsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Уровень для самого hotlaunch
    pub level: String,
    /// "pretty" или "json"
    pub format: String,
    /// Дополнительные директивы EnvFilter для других модулей
    #[serde(default)]
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub backend: String,
    pub polling_interval_ms: u64,
    /// Переносить указатель в центр окна при переключении (дополняется `win_center_mouse`)
    #[serde(default)]
    pub center_mouse: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BindingsConfig {
    /// Не задан - `<каталог настроек пользователя>/hotlaunch/bindings.conf`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: String::new(),
            },
            input: InputConfig {
                device_path: "auto".to_string(),
            },
            window: WindowConfig {
                backend: "auto".to_string(),
                polling_interval_ms: 250,
                center_mouse: false,
            },
            bindings: BindingsConfig::default(),
        }
    }
}

fn bindings_path_in(config_dir: Option<PathBuf>) -> Result<PathBuf> {
    let config_dir = config_dir.context(
        "Не удалось определить каталог настроек пользователя, укажите bindings.path явно",
    )?;
    Ok(config_dir.join("hotlaunch").join("bindings.conf"))
}

impl Settings {
    /// Загрузить настройки: значения по умолчанию, затем TOML файл (если есть),
    /// затем переменные окружения `HOTLAUNCH_*` (вложенность через `__`)
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("HOTLAUNCH_").split("__"));

        let settings: Settings = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        settings.validate()?;

        Ok(settings)
    }

    /// Путь к файлу привязок: явно заданный или в каталоге настроек пользователя
    pub fn bindings_path(&self) -> Result<PathBuf> {
        match &self.bindings.path {
            Some(path) => Ok(path.clone()),
            None => bindings_path_in(dirs::config_dir()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек окон
        match self.window.backend.as_str() {
            "auto" | "x11" | "sway" => {}
            _ => anyhow::bail!("Неизвестный бэкенд оконной системы: {}", self.window.backend),
        }

        if self.window.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        if self.input.device_path.is_empty() {
            anyhow::bail!("input.device_path не может быть пустым (используйте \"auto\")");
        }

        if self.bindings.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            anyhow::bail!("bindings.path не может быть пустым");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config_validation() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.bindings.path.is_none());
    }

    #[test]
    fn test_bindings_path_defaults_to_user_config_dir() {
        let path = bindings_path_in(Some(PathBuf::from("/home/user/.config"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/user/.config/hotlaunch/bindings.conf"));
    }

    #[test]
    fn test_bindings_path_without_config_dir_is_an_error() {
        // Никакого запасного относительного пути
        assert!(bindings_path_in(None).is_err());
    }

    #[test]
    fn test_explicit_bindings_path_wins() {
        let mut settings = Settings::default();
        settings.bindings.path = Some(PathBuf::from("/etc/hotlaunch/bindings.conf"));
        assert_eq!(
            settings.bindings_path().unwrap(),
            PathBuf::from("/etc/hotlaunch/bindings.conf")
        );

        settings.bindings.path = Some(PathBuf::new());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut settings = Settings::default();
        settings.window.backend = "wayfire".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.window.polling_interval_ms = 10;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.logging.format = "xml".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.window.backend, "auto");
        assert!(!settings.window.center_mouse);
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotlaunch.toml");
        fs::write(
            &path,
            "[window]\nbackend = \"sway\"\npolling_interval_ms = 500\ncenter_mouse = true\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.window.backend, "sway");
        assert_eq!(settings.window.polling_interval_ms, 500);
        assert!(settings.window.center_mouse);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotlaunch.toml");
        fs::write(&path, "[window\nbackend = ").unwrap();

        assert!(Settings::load(&path).is_err());
    }
}
