use crate::error::Result;
use crate::events::{LauncherEvent, WindowEvent, WindowId, WindowInfo};
use crate::services::WindowSystem;
use crate::trace_if_enabled;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Опрашивает список окон и превращает разницу между снимками
/// в события открытия и закрытия окон
pub struct WindowWatcher {
    window_system: Arc<dyn WindowSystem>,
    tx: mpsc::Sender<LauncherEvent>,
    polling_interval: Duration,
    known: Vec<WindowInfo>,
}

impl WindowWatcher {
    /// `initial` - снимок, по которому уже заполнен Launcher
    pub fn new(
        window_system: Arc<dyn WindowSystem>,
        tx: mpsc::Sender<LauncherEvent>,
        polling_interval: Duration,
        initial: Vec<WindowInfo>,
    ) -> Self {
        Self {
            window_system,
            tx,
            polling_interval,
            known: initial,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            "WindowWatcher запущен ({}, интервал {}мс)",
            self.window_system.name(),
            self.polling_interval.as_millis()
        );

        let mut interval = interval(self.polling_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let current = match self.window_system.list_windows() {
                Ok(windows) => windows,
                Err(e) => {
                    warn!("Не удалось получить список окон: {}", e);
                    continue;
                }
            };

            for event in self.diff(current) {
                debug!("Событие окна: {}", event);
                if self.tx.send(LauncherEvent::Window(event)).await.is_err() {
                    info!("Канал событий закрыт, WindowWatcher завершает работу");
                    return Ok(());
                }
            }
        }
    }

    /// Сравнить новый снимок с предыдущим. Окно, у которого сменился
    /// идентификатор приложения, закрывается и открывается заново
    fn diff(&mut self, current: Vec<WindowInfo>) -> Vec<WindowEvent> {
        let previous: HashMap<WindowId, &WindowInfo> =
            self.known.iter().map(|w| (w.id, w)).collect();
        let present: HashMap<WindowId, &WindowInfo> = current.iter().map(|w| (w.id, w)).collect();

        let mut events = Vec::new();

        for old in &self.known {
            match present.get(&old.id) {
                None => events.push(WindowEvent::Closed(old.clone())),
                Some(new) if new.app_id != old.app_id || new.window_type != old.window_type => {
                    events.push(WindowEvent::Closed(old.clone()));
                }
                Some(_) => {}
            }
        }

        for new in &current {
            match previous.get(&new.id) {
                None => events.push(WindowEvent::Opened(new.clone())),
                Some(old) if old.app_id != new.app_id || old.window_type != new.window_type => {
                    events.push(WindowEvent::Opened(new.clone()));
                }
                Some(_) => {}
            }
        }

        trace_if_enabled!("Опрос окон: {} окон, {} событий", current.len(), events.len());
        self.known = current;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::window_system::DryRunWindowSystem;

    fn watcher_for(ws: Arc<DryRunWindowSystem>) -> (WindowWatcher, mpsc::Receiver<LauncherEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let initial = ws.list_windows().unwrap();
        let watcher = WindowWatcher::new(ws, tx, Duration::from_millis(100), initial);
        (watcher, rx)
    }

    #[test]
    fn test_diff_reports_opened_and_closed() {
        let ws = Arc::new(DryRunWindowSystem::new());
        let kept = ws.open("Kept", "app");
        let gone = ws.open("Gone", "app");
        let (mut watcher, _rx) = watcher_for(ws.clone());

        ws.remove_window(gone.id);
        let added = ws.open("Added", "app");

        let events = watcher.diff(ws.list_windows().unwrap());
        assert_eq!(events, vec![WindowEvent::Closed(gone), WindowEvent::Opened(added)]);

        // Повторный опрос без изменений событий не даёт
        assert!(watcher.diff(ws.list_windows().unwrap()).is_empty());
        assert!(watcher.known.iter().any(|w| w.id == kept.id));
    }

    #[test]
    fn test_diff_reopens_window_with_new_app_id() {
        let ws = Arc::new(DryRunWindowSystem::new());
        let window = ws.open("Splash", "loading");
        let (mut watcher, _rx) = watcher_for(ws.clone());

        ws.set_app_id(window.id, "gimp");
        let events = watcher.diff(ws.list_windows().unwrap());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], WindowEvent::Closed(window.clone()));
        match &events[1] {
            WindowEvent::Opened(reopened) => assert_eq!(reopened.app_id.as_deref(), Some("gimp")),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_sends_events_to_channel() {
        let ws = Arc::new(DryRunWindowSystem::new());
        ws.open("Existing", "app");
        let (watcher, mut rx) = watcher_for(ws.clone());

        let handle = tokio::spawn(watcher.run());
        let opened = ws.open("New", "app");

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("нет события за 5 секунд")
            .expect("канал закрыт");
        assert_eq!(event, LauncherEvent::Window(WindowEvent::Opened(opened)));

        handle.abort();
    }

    #[tokio::test]
    async fn test_run_survives_failed_poll() {
        let ws = Arc::new(DryRunWindowSystem::new());
        ws.open("Existing", "app");
        let (watcher, mut rx) = watcher_for(ws.clone());

        ws.fail_listings(2);
        let handle = tokio::spawn(watcher.run());
        let opened = ws.open("New", "app");

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("нет события за 5 секунд")
            .expect("канал закрыт");
        assert_eq!(event, LauncherEvent::Window(WindowEvent::Opened(opened)));
        assert_eq!(ws.pending_failed_listings(), 0);
        assert!(!handle.is_finished());

        handle.abort();
    }
}
