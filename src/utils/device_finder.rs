use crate::error::{HotlaunchError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const BY_ID_DIR: &str = "/dev/input/by-id";
const INPUT_DIR: &str = "/dev/input";

/// Имена, по которым устройство точно не клавиатура
const NOT_KEYBOARDS: &[&str] = &["mouse", "deathadder", "touchpad", "trackpoint", "consumer"];

pub struct DeviceFinder;

impl DeviceFinder {
    /// Путь к клавиатуре: явно указанный или найденный автоматически ("auto")
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            if !path.exists() {
                return HotlaunchError::device_not_found(format!(
                    "Указанное устройство не найдено: {:?}",
                    path
                ));
            }
            info!("Используется указанное устройство: {:?}", path);
            return Ok(path);
        }

        info!("Автопоиск клавиатуры...");
        if let Some(path) = Self::find_by_id()? {
            info!("Найдена клавиатура по ID: {:?}", path);
            return Ok(path);
        }
        if let Some(path) = Self::find_by_event_devices()? {
            info!("Найдена клавиатура среди event устройств: {:?}", path);
            return Ok(path);
        }

        HotlaunchError::device_not_found(
            "Клавиатура не найдена. Убедитесь, что пользователь добавлен в группу 'input'",
        )
    }

    /// Ссылки из /dev/input/by-id, лучшая по приоритету имени
    fn find_by_id() -> Result<Option<PathBuf>> {
        let Some(entries) = Self::read_dir(Path::new(BY_ID_DIR))? else {
            return Ok(None);
        };

        let mut candidates: Vec<(PathBuf, u8)> = entries
            .into_iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?.to_string();
                keyboard_priority(&name).map(|priority| (path, priority))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(candidates
            .into_iter()
            .map(|(path, _)| path)
            .find(|path| Self::is_keyboard_device(path)))
    }

    /// Первое по номеру /dev/input/eventN, похожее на клавиатуру
    fn find_by_event_devices() -> Result<Option<PathBuf>> {
        let Some(mut entries) = Self::read_dir(Path::new(INPUT_DIR))? else {
            return Ok(None);
        };

        entries.retain(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
        });
        entries.sort();

        Ok(entries.into_iter().find(|path| Self::is_keyboard_device(path)))
    }

    fn read_dir(dir: &Path) -> Result<Option<Vec<PathBuf>>> {
        if !dir.exists() {
            debug!("Каталог {:?} не существует", dir);
            return Ok(None);
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| HotlaunchError::Permission(format!("Нет доступа к {:?}: {}", dir, e)))?;

        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(Some(paths))
    }

    /// Устройство открывается и умеет основные клавиши клавиатуры
    fn is_keyboard_device(path: &Path) -> bool {
        let device = match evdev::Device::open(path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть {:?}: {}", path, e);
                return false;
            }
        };

        let name = device.name().unwrap_or("Unknown").to_lowercase();
        if NOT_KEYBOARDS.iter().any(|word| name.contains(word)) {
            debug!("{:?} ({}) - не клавиатура", path, name);
            return false;
        }

        let is_keyboard = device.supported_keys().is_some_and(|keys| {
            [evdev::KeyCode::KEY_A, evdev::KeyCode::KEY_SPACE, evdev::KeyCode::KEY_ENTER]
                .iter()
                .all(|&key| keys.contains(key))
                && keys.iter().count() > 20
        });

        debug!("{:?} ({}): клавиатура = {}", path, name, is_keyboard);
        is_keyboard
    }
}

/// Приоритет ссылки из /dev/input/by-id по её имени; `None` - не клавиатура
fn keyboard_priority(name: &str) -> Option<u8> {
    let lower = name.to_lowercase();
    if !lower.contains("event") || NOT_KEYBOARDS.iter().any(|word| lower.contains(word)) {
        return None;
    }

    if lower.ends_with("event-kbd") {
        Some(100)
    } else if lower.contains("keyboard") {
        Some(50)
    } else if lower.contains("kbd") {
        Some(10)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_path_is_an_error() {
        let result = DeviceFinder::find_keyboard_device("/non/existent/path");
        assert!(matches!(result, Err(HotlaunchError::DeviceNotFound(_))));
    }

    #[test]
    fn test_explicit_existing_path_is_used_as_is() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(DeviceFinder::find_keyboard_device(path).unwrap(), file.path());
    }

    #[test]
    fn test_keyboard_priority() {
        assert_eq!(keyboard_priority("usb-Logitech_USB_Receiver-event-kbd"), Some(100));
        assert_eq!(keyboard_priority("usb-Some_Keyboard-if01-event-joystick"), Some(50));
        assert_eq!(keyboard_priority("platform-i8042-serio-0-kbd-event"), Some(10));
        assert_eq!(keyboard_priority("usb-Razer_DeathAdder-event-kbd"), None);
        assert_eq!(keyboard_priority("usb-Logitech_Mouse-event-mouse"), None);
        assert_eq!(keyboard_priority("usb-Logitech_USB_Receiver-kbd"), None);
    }
}
