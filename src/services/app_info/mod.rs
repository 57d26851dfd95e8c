//! Application-info service: resolves a desktop id to something launchable
//! and launches it. Launches are fire-and-forget; the new window shows up
//! later as an ordinary window-opened event.

mod desktop_entries;
mod dry_run;

pub use self::desktop_entries::DesktopEntries;
pub use self::dry_run::DryRunAppInfo;

use crate::error::Result;
use std::path::PathBuf;

/// Приложение, найденное по идентификатору
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopApp {
    /// Нормализованный идентификатор (`firefox_firefox.desktop`)
    pub id: String,
    pub name: String,
    /// Команда запуска без кодов полей (`%u`, `%F`, ...)
    pub command: String,
    pub terminal: bool,
    pub path: Option<PathBuf>,
}

pub trait AppInfoService: Send + Sync {
    /// Найти приложение по нормализованному идентификатору
    fn lookup(&self, app_id: &str) -> Option<DesktopApp>;

    /// Запустить без аргументов и не ждать появления окна
    fn launch(&self, app: &DesktopApp) -> Result<()>;
}
