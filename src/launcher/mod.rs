//! Реестр приложений: какие окна принадлежат какому приложению и что делать
//! по горячей клавише.
//!
//! Launcher принадлежит единственному циклу-диспетчеру и меняется только из него,
//! поэтому внутри нет блокировок. Запуск приложения ничего не меняет в реестре:
//! новое окно придёт позже обычным событием открытия.

mod app_collection;
mod app_window;
pub mod ident;

pub use self::app_collection::AppCollection;
pub use self::app_window::AppWindow;

use self::ident::{ids_match, normalize_app_id, OTHER_APP_ID};
use crate::bindings::{Action, Keymap};
use crate::events::{LauncherEvent, WindowEvent, WindowId, WindowInfo, WindowType};
use crate::services::{AppInfoService, WindowSystem};
use crate::debug_if_enabled;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Чем закончилась обработка горячей клавиши приложения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Приложение уже в фокусе, переход к его следующему окну
    Cycled,
    /// Переключение на последнее использованное окно приложения
    Switched,
    /// Окон нет, приложение запущено
    Launched,
    /// Окон нет, и запускать нечего
    NotFound,
    /// Приложение найдено, но запуск не удался
    LaunchFailed,
    /// Окон "прочих" приложений нет
    Idle,
}

impl fmt::Display for HandleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandleOutcome::Cycled => "cycle",
            HandleOutcome::Switched => "switch",
            HandleOutcome::Launched => "launch",
            HandleOutcome::NotFound => "not found",
            HandleOutcome::LaunchFailed => "launch failed",
            HandleOutcome::Idle => "idle",
        };
        write!(f, "{}", name)
    }
}

pub struct Launcher {
    window_system: Arc<dyn WindowSystem>,
    app_info: Arc<dyn AppInfoService>,
    apps: HashMap<String, AppCollection>,
    /// Привязанные идентификаторы в порядке файла привязок
    bound_ids: Vec<String>,
    center_pointer: bool,
    own_pid: u32,
}

impl Launcher {
    pub fn new(
        window_system: Arc<dyn WindowSystem>,
        app_info: Arc<dyn AppInfoService>,
        keymap: &Keymap,
    ) -> Self {
        Self {
            window_system,
            app_info,
            apps: HashMap::new(),
            bound_ids: keymap.bound_app_ids(),
            center_pointer: keymap.center_mouse,
            own_pid: std::process::id(),
        }
    }

    /// Окна процесса с этим pid считаются собственными и не отслеживаются
    pub fn with_own_pid(mut self, pid: u32) -> Self {
        self.own_pid = pid;
        self
    }

    /// Заполнить реестр уже открытыми окнами.
    ///
    /// Возвращает снимок, с которым сравнивает свои опросы наблюдатель окон.
    pub fn bootstrap(&mut self) -> Vec<WindowInfo> {
        let windows = match self.window_system.list_windows() {
            Ok(windows) => windows,
            Err(e) => {
                warn!("Не удалось получить список окон при запуске: {}", e);
                return Vec::new();
            }
        };

        for window in &windows {
            self.store_app(window);
        }

        info!(
            "Реестр заполнен: {} окон, {} приложений ({})",
            self.tracked_windows(),
            self.apps.len(),
            self.window_system.name()
        );
        debug!("Приложения: {:?}", self.app_ids().collect::<Vec<_>>());
        windows
    }

    fn is_trackable(&self, window: &WindowInfo) -> bool {
        window.window_type == WindowType::Normal && window.pid != Some(self.own_pid)
    }

    /// Идентификатор приложения для окна. Любая ошибка оконной системы даёт [`OTHER_APP_ID`]
    pub fn resolve_window_identifier(&self, window: Option<WindowId>) -> String {
        let Some(id) = window else {
            return OTHER_APP_ID.to_string();
        };

        match self.window_system.window_info(id) {
            Ok(Some(info)) => self.resolve_app_id(info.app_id.as_deref()),
            Ok(None) => OTHER_APP_ID.to_string(),
            Err(e) => {
                warn!("Не удалось определить приложение окна {}: {}", id, e);
                OTHER_APP_ID.to_string()
            }
        }
    }

    /// Сопоставить сообщённый оконной системой идентификатор с привязанными:
    /// сначала точное совпадение, затем первое совпадение по вхождению подстроки
    pub fn resolve_app_id(&self, reported: Option<&str>) -> String {
        let reported = match reported.map(str::trim) {
            Some(reported) if !reported.is_empty() => reported,
            _ => return OTHER_APP_ID.to_string(),
        };

        let normalized = normalize_app_id(reported);
        if let Some(bound) = self.bound_ids.iter().find(|b| **b == reported || **b == normalized) {
            return bound.clone();
        }

        match self.bound_ids.iter().find(|bound| ids_match(reported, bound)) {
            Some(bound) => {
                debug_if_enabled!("{} сопоставлен с {}", reported, bound);
                bound.clone()
            }
            None => OTHER_APP_ID.to_string(),
        }
    }

    /// Запомнить окно в коллекции его приложения
    pub fn store_app(&mut self, window: &WindowInfo) {
        if !self.is_trackable(window) {
            debug!("Окно {} не отслеживается", window);
            return;
        }

        let app_id = self.resolve_app_id(window.app_id.as_deref());

        // Окно не может числиться за двумя приложениями
        let moved = self.remove_everywhere_except(window.id, &app_id);
        if moved {
            debug!("Окно {} перенесено в {}", window.id, app_id);
        }

        let record = AppWindow::new(window);
        match self.apps.get_mut(&app_id) {
            Some(collection) => {
                if collection.store_app(record) {
                    debug!("{}: добавлено окно {} ({})", app_id, window.id, collection.size());
                }
            }
            None => {
                debug!("{}: первое окно {}", app_id, window.id);
                self.apps
                    .insert(app_id, AppCollection::new(record, self.center_pointer));
            }
        }
    }

    /// Забыть закрытое окно. Пустая коллекция удаляется из реестра
    pub fn delete_app(&mut self, window: &WindowInfo) {
        let app_id = self.resolve_app_id(window.app_id.as_deref());

        let (removed, emptied) = match self.apps.get_mut(&app_id) {
            Some(collection) => (collection.delete_app(window.id), collection.is_empty()),
            None => (false, false),
        };
        if emptied {
            self.apps.remove(&app_id);
            debug!("{}: окон не осталось", app_id);
        }

        // Идентификатор мог измениться после открытия окна
        if !removed && !self.remove_everywhere_except(window.id, &app_id) {
            debug_if_enabled!("Окно {} не найдено в реестре", window.id);
        }
    }

    /// Убрать окно из всех коллекций, кроме `keep`. Возвращает true, если что-то удалено
    fn remove_everywhere_except(&mut self, id: WindowId, keep: &str) -> bool {
        let mut removed = false;
        self.apps.retain(|app_id, collection| {
            if app_id != keep && collection.delete_app(id) {
                removed = true;
            }
            !collection.is_empty()
        });
        removed
    }

    /// Горячая клавиша приложения: перебрать его окна, переключиться на него или запустить
    pub fn handle_app(&mut self, app_id: &str) -> HandleOutcome {
        let app_id = normalize_app_id(app_id);

        let focused = self.window_system.focused_window().unwrap_or_else(|e| {
            warn!("Не удалось получить окно в фокусе: {}", e);
            None
        });
        let focused_app = self.resolve_window_identifier(focused);

        if let Some(collection) = self.apps.get(&app_id) {
            if focused_app == app_id {
                let target = collection.go_next(self.window_system.as_ref());
                info!("cycle {} -> {:?}", app_id, target);
                return HandleOutcome::Cycled;
            }

            let target = collection.switch_to_app(self.window_system.as_ref());
            info!("switch {} -> {:?}", app_id, target);
            return HandleOutcome::Switched;
        }

        if app_id == OTHER_APP_ID {
            debug!("Окон прочих приложений нет");
            return HandleOutcome::Idle;
        }

        let Some(app) = self.app_info.lookup(&app_id) else {
            error!("Приложение {} не найдено", app_id);
            return HandleOutcome::NotFound;
        };

        match self.app_info.launch(&app) {
            Ok(()) => {
                info!("launch {} ({})", app_id, app.name);
                HandleOutcome::Launched
            }
            Err(e) => {
                error!("Не удалось запустить {}: {}", app_id, e);
                HandleOutcome::LaunchFailed
            }
        }
    }

    /// Перебор окон, не принадлежащих привязанным приложениям
    pub fn cycle_other(&mut self) -> HandleOutcome {
        self.handle_app(OTHER_APP_ID)
    }

    /// Вернуться ко второму окну в общей истории фокуса
    pub fn previous_window(&self) -> Option<WindowId> {
        let recent = match self.window_system.recent_windows() {
            Ok(recent) => recent,
            Err(e) => {
                warn!("Не удалось получить историю фокуса: {}", e);
                return None;
            }
        };

        let target = *recent.get(1)?;
        AppWindow::from_id(target).focus(self.window_system.as_ref(), self.center_pointer);
        info!("previous -> {}", target);
        Some(target)
    }

    /// Закрыть окно в фокусе. Реестр обновится по событию закрытия
    pub fn delete_focused(&self) -> Option<WindowId> {
        let focused = match self.window_system.focused_window() {
            Ok(Some(id)) => id,
            Ok(None) => return None,
            Err(e) => {
                warn!("Не удалось получить окно в фокусе: {}", e);
                return None;
            }
        };

        match self.window_system.close(focused) {
            Ok(()) => {
                info!("close {}", focused);
                Some(focused)
            }
            Err(e) => {
                warn!("Не удалось закрыть окно {}: {}", focused, e);
                None
            }
        }
    }

    pub fn dispatch(&mut self, action: &Action) {
        debug!("Действие: {}", action);
        match action {
            Action::Launch(app_id) => {
                self.handle_app(app_id);
            }
            Action::CycleOther => {
                self.cycle_other();
            }
            Action::DeleteFocused => {
                self.delete_focused();
            }
            Action::PreviousWindow => {
                self.previous_window();
            }
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Opened(window) => self.store_app(window),
            WindowEvent::Closed(window) => self.delete_app(window),
        }
    }

    pub fn handle_event(&mut self, event: LauncherEvent) {
        match event {
            LauncherEvent::Hotkey(action) => self.dispatch(&action),
            LauncherEvent::Window(event) => self.handle_window_event(&event),
        }
    }

    /// Завершение работы: очистить реестр
    pub fn shutdown(&mut self) {
        info!(
            "Launcher остановлен: {} окон в {} приложениях",
            self.tracked_windows(),
            self.apps.len()
        );
        self.apps.clear();
    }

    pub fn collection(&self, app_id: &str) -> Option<&AppCollection> {
        self.apps.get(app_id)
    }

    pub fn app_ids(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn tracked_windows(&self) -> usize {
        self.apps.values().map(AppCollection::size).sum()
    }

    pub fn bound_ids(&self) -> &[String] {
        &self.bound_ids
    }

    pub fn center_pointer(&self) -> bool {
        self.center_pointer
    }
}
