use crate::error::{HotlaunchError, Result};
use crate::events::{WindowId, WindowInfo};
use std::sync::Arc;
use tracing::info;

use super::sway::SwayWindowSystem;
use super::x11::X11WindowSystem;

/// Adapter over the host window system.
///
/// Implementations are thin wrappers over external tools or IPC and are
/// expected to be called from the single dispatcher loop.
pub trait WindowSystem: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// All top-level windows in a stable order
    fn list_windows(&self) -> Result<Vec<WindowInfo>>;

    /// Metadata for one window; `None` if it no longer exists
    fn window_info(&self, id: WindowId) -> Result<Option<WindowInfo>> {
        Ok(self.list_windows()?.into_iter().find(|w| w.id == id))
    }

    /// Window that currently has input focus
    fn focused_window(&self) -> Result<Option<WindowId>>;

    /// Normal windows ordered by recency of use, most recent first.
    ///
    /// Backends without a real focus history approximate it. The X11 backend
    /// uses the stacking order, which only matches recency under window
    /// managers that raise a window when it receives focus.
    fn recent_windows(&self) -> Result<Vec<WindowId>>;

    /// Raise and focus a window
    fn activate(&self, id: WindowId) -> Result<()>;

    /// Warp the pointer to the centre of a window
    fn center_pointer(&self, id: WindowId) -> Result<()>;

    /// Ask a window to close
    fn close(&self, id: WindowId) -> Result<()>;
}

/// Factory for a real window system backend: "x11", "sway" or "auto"
pub fn create_window_system(backend: &str) -> Result<Arc<dyn WindowSystem>> {
    match backend {
        "x11" => Ok(Arc::new(X11WindowSystem::new())),
        "sway" => Ok(Arc::new(SwayWindowSystem::new())),
        "auto" => detect_window_system(),
        other => Err(HotlaunchError::ServiceUnavailable(format!(
            "Неизвестный бэкенд оконной системы: {}",
            other
        ))),
    }
}

fn detect_window_system() -> Result<Arc<dyn WindowSystem>> {
    info!("Определяем бэкенд оконной системы...");

    if std::env::var_os("SWAYSOCK").is_some() {
        let sway = SwayWindowSystem::new();
        if sway.test().is_ok() {
            info!("Используем sway");
            return Ok(Arc::new(sway));
        }
    }

    let x11 = X11WindowSystem::new();
    if x11.test().is_ok() {
        info!("Используем x11 (wmctrl/xprop/xdotool)");
        return Ok(Arc::new(x11));
    }

    Err(HotlaunchError::ServiceUnavailable(
        "Ни один бэкенд оконной системы не работает (нужен swaymsg или wmctrl)".to_string(),
    ))
}
