use crate::error::Result;
use crate::hotlaunch_error;
use crate::events::{WindowId, WindowInfo};
use parking_lot::RwLock;
use tracing::info;

use super::r#trait::WindowSystem;

/// Оконная система в памяти: режим сухого запуска и тесты
pub struct DryRunWindowSystem {
    state: RwLock<DryRunState>,
}

#[derive(Default)]
struct DryRunState {
    windows: Vec<WindowInfo>,
    /// История фокуса, последнее окно первым
    recent: Vec<WindowId>,
    next_id: u64,
    centered: Vec<WindowId>,
    #[cfg(test)]
    broken: std::collections::HashSet<WindowId>,
    #[cfg(test)]
    failed_listings: usize,
}

impl Default for DryRunWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunWindowSystem {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DryRunState {
                next_id: 0x0100_0001,
                ..DryRunState::default()
            }),
        }
    }

    /// Несколько эмулированных окон для режима сухого запуска
    pub fn with_demo_windows() -> Self {
        let ws = Self::new();
        ws.open("Terminal - dry_run", "org.gnome.Terminal");
        ws.open("Browser - dry_run", "firefox_firefox");
        ws.open("Browser docs - dry_run", "firefox_firefox");
        ws.open("Editor - dry_run", "Emacs (Client)");
        ws
    }

    /// Открыть новое обычное окно; как и настоящее, оно сразу получает фокус
    pub fn open(&self, title: &str, app_id: &str) -> WindowInfo {
        let mut state = self.state.write();
        let id = WindowId(state.next_id);
        state.next_id += 1;

        let window = WindowInfo::new(id, title.to_string())
            .with_class(app_id.to_string())
            .with_app_id(app_id);

        state.windows.push(window.clone());
        state.recent.insert(0, id);
        window
    }

    /// Добавить готовое окно (любого типа) без передачи фокуса и без истории
    pub fn insert(&self, window: WindowInfo) {
        self.state.write().windows.push(window);
    }

    pub fn remove_window(&self, id: WindowId) -> Option<WindowInfo> {
        let mut state = self.state.write();
        state.recent.retain(|&w| w != id);
        let index = state.windows.iter().position(|w| w.id == id)?;
        Some(state.windows.remove(index))
    }

    /// Окна, в центр которых переносился указатель
    pub fn centered(&self) -> Vec<WindowId> {
        self.state.read().centered.clone()
    }

    #[cfg(test)]
    pub fn set_app_id(&self, id: WindowId, app_id: &str) {
        let mut state = self.state.write();
        if let Some(window) = state.windows.iter_mut().find(|w| w.id == id) {
            window.app_id = Some(app_id.to_string());
        }
    }

    /// Запросы метаданных этого окна будут завершаться ошибкой
    #[cfg(test)]
    pub fn break_window(&self, id: WindowId) {
        self.state.write().broken.insert(id);
    }

    /// Следующие `count` вызовов list_windows завершатся ошибкой
    #[cfg(test)]
    pub fn fail_listings(&self, count: usize) {
        self.state.write().failed_listings = count;
    }

    #[cfg(test)]
    pub fn pending_failed_listings(&self) -> usize {
        self.state.read().failed_listings
    }

    #[cfg(test)]
    fn take_listing_failure(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.failed_listings > 0 {
            state.failed_listings -= 1;
            return Err(hotlaunch_error!(window_system, "список окон недоступен"));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn take_listing_failure(&self) -> Result<()> {
        Ok(())
    }

    #[cfg(test)]
    fn ensure_reachable(state: &DryRunState, id: WindowId) -> Result<()> {
        if state.broken.contains(&id) {
            return Err(hotlaunch_error!(window_system, "окно {} недоступно", id));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn ensure_reachable(_state: &DryRunState, _id: WindowId) -> Result<()> {
        Ok(())
    }

    fn exists(state: &DryRunState, id: WindowId) -> bool {
        state.windows.iter().any(|w| w.id == id)
    }
}

impl WindowSystem for DryRunWindowSystem {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        self.take_listing_failure()?;
        Ok(self.state.read().windows.clone())
    }

    fn window_info(&self, id: WindowId) -> Result<Option<WindowInfo>> {
        let state = self.state.read();
        Self::ensure_reachable(&state, id)?;
        Ok(state.windows.iter().find(|w| w.id == id).cloned())
    }

    fn focused_window(&self) -> Result<Option<WindowId>> {
        Ok(self.state.read().recent.first().copied())
    }

    fn recent_windows(&self) -> Result<Vec<WindowId>> {
        Ok(self.state.read().recent.clone())
    }

    fn activate(&self, id: WindowId) -> Result<()> {
        let mut state = self.state.write();
        if !Self::exists(&state, id) {
            return Err(hotlaunch_error!(window_system, "нет окна {}", id));
        }
        state.recent.retain(|&w| w != id);
        state.recent.insert(0, id);
        info!("[DRY RUN] Активировано окно {}", id);
        Ok(())
    }

    fn center_pointer(&self, id: WindowId) -> Result<()> {
        let mut state = self.state.write();
        if !Self::exists(&state, id) {
            return Err(hotlaunch_error!(window_system, "нет окна {}", id));
        }
        state.centered.push(id);
        Ok(())
    }

    fn close(&self, id: WindowId) -> Result<()> {
        match self.remove_window(id) {
            Some(window) => {
                info!("[DRY RUN] Закрыто окно {}", window);
                Ok(())
            }
            None => Err(hotlaunch_error!(window_system, "нет окна {}", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_focuses_new_window() {
        let ws = DryRunWindowSystem::new();
        let a = ws.open("A", "app");
        let b = ws.open("B", "app");

        assert_eq!(ws.focused_window().unwrap(), Some(b.id));
        assert_eq!(ws.recent_windows().unwrap(), vec![b.id, a.id]);
        assert_eq!(ws.list_windows().unwrap(), vec![a.clone(), b]);
        assert_eq!(ws.window_info(a.id).unwrap(), Some(a));
    }

    #[test]
    fn close_removes_window_and_history() {
        let ws = DryRunWindowSystem::new();
        let a = ws.open("A", "app");
        let b = ws.open("B", "app");

        ws.close(b.id).unwrap();
        assert_eq!(ws.focused_window().unwrap(), Some(a.id));
        assert!(ws.close(b.id).is_err());
        assert_eq!(ws.window_info(b.id).unwrap(), None);
    }

    #[test]
    fn demo_windows_are_present() {
        let ws = DryRunWindowSystem::with_demo_windows();
        assert_eq!(ws.list_windows().unwrap().len(), 4);
    }
}
