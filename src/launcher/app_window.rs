use crate::events::{WindowId, WindowInfo};
use crate::services::WindowSystem;
use tracing::debug;

/// Запись об одном окне верхнего уровня.
///
/// Ссылки на коллекцию-владельца нет: принадлежность задаёт только коллекция.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppWindow {
    id: WindowId,
    name: String,
}

impl AppWindow {
    pub fn new(window: &WindowInfo) -> Self {
        Self {
            id: window.id,
            name: window.display_name().to_string(),
        }
    }

    /// Запись для окна, о котором известен только идентификатор
    pub fn from_id(id: WindowId) -> Self {
        Self { id, name: id.to_string() }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Вывести окно на передний план. Ошибки оконной системы не пробрасываются:
    /// для устаревшего окна вызов ничего не делает
    pub fn focus(&self, window_system: &dyn WindowSystem, center_pointer: bool) {
        debug!("Фокус на окно {} ({})", self.id, self.name);

        if let Err(e) = window_system.activate(self.id) {
            debug!("Не удалось активировать окно {}: {}", self.id, e);
            return;
        }

        if center_pointer {
            if let Err(e) = window_system.center_pointer(self.id) {
                debug!("Не удалось перенести указатель в центр окна {}: {}", self.id, e);
            }
        }
    }
}
