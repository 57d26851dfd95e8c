use super::app_window::AppWindow;
use crate::events::WindowId;
use crate::services::WindowSystem;
use tracing::debug;

/// Окна одного приложения в порядке появления.
///
/// Текущее окно не хранится: при переключении каждый раз спрашиваем оконную
/// систему, чтобы не расходиться с фокусом, изменённым извне.
#[derive(Debug, Clone)]
pub struct AppCollection {
    windows: Vec<AppWindow>,
    center_pointer: bool,
}

impl AppCollection {
    /// Коллекция всегда создаётся ровно с одним окном
    pub fn new(first: AppWindow, center_pointer: bool) -> Self {
        Self {
            windows: vec![first],
            center_pointer,
        }
    }

    /// Добавить окно в конец. Повторное добавление того же окна игнорируется
    pub fn store_app(&mut self, window: AppWindow) -> bool {
        if self.contains(window.id()) {
            return false;
        }
        self.windows.push(window);
        true
    }

    /// Удалить окно. Возвращает false, если такого окна нет
    pub fn delete_app(&mut self, id: WindowId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.windows.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn size(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.position(id).is_some()
    }

    fn position(&self, id: WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id() == id)
    }

    /// Перейти к окну, следующему за окном в фокусе (по кругу).
    /// Если фокус вне коллекции - к первому окну
    pub fn go_next(&self, window_system: &dyn WindowSystem) -> Option<WindowId> {
        if self.windows.is_empty() {
            return None;
        }

        let focused = window_system.focused_window().unwrap_or_else(|e| {
            debug!("Не удалось получить окно в фокусе: {}", e);
            None
        });

        let next = match focused.and_then(|id| self.position(id)) {
            Some(index) => (index + 1) % self.windows.len(),
            None => 0,
        };

        let target = &self.windows[next];
        target.focus(window_system, self.center_pointer);
        Some(target.id())
    }

    /// Перейти к последнему использованному окну коллекции (по истории фокуса оконной системы)
    pub fn switch_to_app(&self, window_system: &dyn WindowSystem) -> Option<WindowId> {
        let recent = window_system.recent_windows().unwrap_or_else(|e| {
            debug!("Не удалось получить историю фокуса: {}", e);
            Vec::new()
        });

        let target = recent
            .iter()
            .find_map(|&id| self.position(id).map(|index| &self.windows[index]))
            .or_else(|| self.windows.first())?;

        target.focus(window_system, self.center_pointer);
        Some(target.id())
    }
}
