pub mod keyboard;
pub mod window;

pub use keyboard::{Hotkey, KeyCode, KeyEvent, KeyState, Modifiers};
pub use window::{WindowEvent, WindowId, WindowInfo, WindowType};

use crate::bindings::Action;
use std::fmt;

/// Всё, что обрабатывает диспетчер Launcher: горячие клавиши и события окон
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LauncherEvent {
    Hotkey(Action),
    Window(WindowEvent),
}

impl fmt::Display for LauncherEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LauncherEvent::Hotkey(action) => write!(f, "hotkey -> {}", action),
            LauncherEvent::Window(event) => write!(f, "window {}", event),
        }
    }
}
