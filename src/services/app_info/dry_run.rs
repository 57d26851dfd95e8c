use crate::error::Result;
use crate::services::window_system::DryRunWindowSystem;
use std::sync::Arc;
use tracing::info;

use super::{AppInfoService, DesktopApp};

/// Находит любое приложение; "запуск" открывает окно в эмулированной оконной системе,
/// которое затем приходит обычным событием от наблюдателя окон
pub struct DryRunAppInfo {
    window_system: Arc<DryRunWindowSystem>,
}

impl DryRunAppInfo {
    pub fn new(window_system: Arc<DryRunWindowSystem>) -> Self {
        Self { window_system }
    }
}

impl AppInfoService for DryRunAppInfo {
    fn lookup(&self, app_id: &str) -> Option<DesktopApp> {
        let name = app_id.trim_end_matches(".desktop").to_string();
        Some(DesktopApp {
            id: app_id.to_string(),
            command: format!("dry-run {}", name),
            name,
            terminal: false,
            path: None,
        })
    }

    fn launch(&self, app: &DesktopApp) -> Result<()> {
        let window = self
            .window_system
            .open(&format!("{} - dry_run", app.name), &app.name);
        info!("[DRY RUN] Запущено {}, появится окно {}", app.id, window.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::WindowSystem;

    #[test]
    fn launch_opens_a_window() {
        let ws = Arc::new(DryRunWindowSystem::new());
        let app_info = DryRunAppInfo::new(ws.clone());

        let app = app_info.lookup("gimp.desktop").unwrap();
        assert_eq!(app.name, "gimp");
        app_info.launch(&app).unwrap();

        let windows = ws.list_windows().unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].app_id.as_deref(), Some("gimp"));
    }
}
