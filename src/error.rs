use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotlaunchError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка разбора JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ошибка файла привязок: {0}")]
    Bindings(String),

    #[error("Ошибка оконной системы: {0}")]
    WindowSystem(String),

    #[error("Не удалось запустить приложение: {0}")]
    Launch(String),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl HotlaunchError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(HotlaunchError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, HotlaunchError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! hotlaunch_error {
    (bindings, $($arg:tt)*) => {
        $crate::error::HotlaunchError::Bindings(format!($($arg)*))
    };
    (window_system, $($arg:tt)*) => {
        $crate::error::HotlaunchError::WindowSystem(format!($($arg)*))
    };
    (launch, $($arg:tt)*) => {
        $crate::error::HotlaunchError::Launch(format!($($arg)*))
    };
}
