use crate::error::{HotlaunchError, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Проверить, что клавиатуру можно читать
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");
    check_input_devices_access(Path::new("/dev/input"))?;
    check_not_root();
    Ok(())
}

fn check_input_devices_access(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        return Err(HotlaunchError::Permission(format!(
            "Каталог {:?} не существует",
            input_dir
        )));
    }

    fs::read_dir(input_dir).map_err(|e| {
        HotlaunchError::Permission(format!(
            "Нет доступа к {:?}: {}. Добавьте пользователя в группу 'input': {}",
            input_dir,
            e,
            setup_command()
        ))
    })?;

    info!("Доступ к {:?} подтверждён", input_dir);
    Ok(())
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Запуск от имени root: окна и приложения будут принадлежать root");
            warn!("Лучше добавить пользователя в группу 'input': {}", setup_command());
        }
        Ok(user) => info!("Запуск от имени пользователя: {}", user),
        Err(_) => warn!("Не удалось определить пользователя"),
    }
}

fn setup_command() -> &'static str {
    "sudo usermod -a -G input $USER (затем перезайдите в систему)"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_dir_is_a_permission_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = check_input_devices_access(&dir.path().join("input"));
        assert!(matches!(result, Err(HotlaunchError::Permission(_))));
    }

    #[test]
    fn test_readable_input_dir_passes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_input_devices_access(dir.path()).is_ok());
    }
}
