use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор окна верхнего уровня (X11 XID или sway con_id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Тип окна в терминах EWMH (_NET_WM_WINDOW_TYPE)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowType {
    #[default]
    Normal,
    Dialog,
    Utility,
    Dock,
    Desktop,
    Splash,
    Other,
}

impl WindowType {
    /// Разобрать атом _NET_WM_WINDOW_TYPE_* (или его хвост)
    pub fn from_atom(atom: &str) -> Self {
        let name = atom.trim().trim_start_matches("_NET_WM_WINDOW_TYPE_");
        match name.to_ascii_uppercase().as_str() {
            "NORMAL" => WindowType::Normal,
            "DIALOG" => WindowType::Dialog,
            "UTILITY" | "TOOLBAR" | "MENU" => WindowType::Utility,
            "DOCK" => WindowType::Dock,
            "DESKTOP" => WindowType::Desktop,
            "SPLASH" => WindowType::Splash,
            _ => WindowType::Other,
        }
    }
}

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub class: String,
    /// Идентификатор приложения, которому принадлежит окно (если бэкенд его знает)
    pub app_id: Option<String>,
    pub pid: Option<u32>,
    pub window_type: WindowType,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: String) -> Self {
        Self {
            id,
            title,
            class: String::new(),
            app_id: None,
            pid: None,
            window_type: WindowType::Normal,
        }
    }

    pub fn with_class(mut self, class: String) -> Self {
        self.class = class;
        self
    }

    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    /// Имя для логов: класс, если известен, иначе заголовок
    pub fn display_name(&self) -> &str {
        if self.class.is_empty() {
            &self.title
        } else {
            &self.class
        }
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "{} \"{}\"", self.id, self.title)
        } else {
            write!(f, "{} \"{}\" ({})", self.id, self.title, self.class)
        }
    }
}

/// Событие жизненного цикла окна верхнего уровня
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEvent {
    Opened(WindowInfo),
    /// Содержит последний известный снимок окна: само окно уже может не существовать
    Closed(WindowInfo),
}

impl WindowEvent {
    pub fn window(&self) -> &WindowInfo {
        match self {
            WindowEvent::Opened(window) | WindowEvent::Closed(window) => window,
        }
    }
}

impl fmt::Display for WindowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowEvent::Opened(window) => write!(f, "Opened: {}", window),
            WindowEvent::Closed(window) => write!(f, "Closed: {}", window),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_creation() {
        let window = WindowInfo::new(WindowId(0x1a00003), "Test Window".to_string())
            .with_class("TestApp".to_string())
            .with_app_id("testapp.desktop")
            .with_pid(1234);

        assert_eq!(window.title, "Test Window");
        assert_eq!(window.class, "TestApp");
        assert_eq!(window.app_id.as_deref(), Some("testapp.desktop"));
        assert_eq!(window.pid, Some(1234));
        assert_eq!(window.window_type, WindowType::Normal);
        assert_eq!(window.display_name(), "TestApp");
    }

    #[test]
    fn test_window_type_from_atom() {
        assert_eq!(WindowType::from_atom("_NET_WM_WINDOW_TYPE_NORMAL"), WindowType::Normal);
        assert_eq!(WindowType::from_atom("_NET_WM_WINDOW_TYPE_DOCK"), WindowType::Dock);
        assert_eq!(WindowType::from_atom("dialog"), WindowType::Dialog);
        assert_eq!(WindowType::from_atom("_KDE_NET_WM_WINDOW_TYPE_OVERRIDE"), WindowType::Other);
    }

    #[test]
    fn test_window_event_accessor() {
        let window = WindowInfo::new(WindowId(7), "Test".to_string());
        let event = WindowEvent::Closed(window.clone());

        assert_eq!(event.window(), &window);
        assert!(event.to_string().starts_with("Closed"));
    }
}
