pub mod app_info;
pub mod hotkey_listener;
pub mod window_system;
pub mod window_watcher;

pub use app_info::{AppInfoService, DesktopEntries, DryRunAppInfo};
pub use hotkey_listener::create_hotkey_listener;
pub use window_system::{create_window_system, DryRunWindowSystem, WindowSystem};
pub use window_watcher::WindowWatcher;

use crate::config::Settings;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Адаптеры рабочего стола, с которыми работает Launcher
pub struct DesktopServices {
    pub window_system: Arc<dyn WindowSystem>,
    pub app_info: Arc<dyn AppInfoService>,
}

/// В режиме сухого запуска оконная система и "запуск" приложений
/// работают с одним и тем же эмулированным состоянием
pub fn create_desktop_services(settings: &Settings, dry_run: bool) -> Result<DesktopServices> {
    if dry_run {
        info!("Dry-run режим - оконная система эмулируется");
        let window_system = Arc::new(DryRunWindowSystem::with_demo_windows());
        return Ok(DesktopServices {
            app_info: Arc::new(DryRunAppInfo::new(window_system.clone())),
            window_system,
        });
    }

    Ok(DesktopServices {
        window_system: create_window_system(&settings.window.backend)?,
        app_info: Arc::new(DesktopEntries::new()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_services_share_window_state() {
        let services = create_desktop_services(&Settings::default(), true).unwrap();
        let before = services.window_system.list_windows().unwrap().len();

        let app = services.app_info.lookup("gimp.desktop").unwrap();
        services.app_info.launch(&app).unwrap();

        assert_eq!(services.window_system.list_windows().unwrap().len(), before + 1);
        assert_eq!(services.window_system.name(), "dry-run");
    }
}
