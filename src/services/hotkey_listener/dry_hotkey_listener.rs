use crate::bindings::Keymap;
use crate::error::Result;
use crate::events::LauncherEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use super::r#trait::HotkeyListenerTrait;

const REPLAY_INTERVAL: Duration = Duration::from_secs(5);

/// По очереди "нажимает" все привязанные клавиши
pub struct DryRunHotkeyListener {
    keymap: Arc<Keymap>,
    tx: mpsc::Sender<LauncherEvent>,
}

impl DryRunHotkeyListener {
    pub fn new(keymap: Arc<Keymap>, tx: mpsc::Sender<LauncherEvent>) -> Self {
        info!("Инициализация DryRunHotkeyListener");
        Self { keymap, tx }
    }

    async fn run_impl(self) -> Result<()> {
        info!(
            "Dry-run режим - {} привязок воспроизводятся каждые {}с",
            self.keymap.len(),
            REPLAY_INTERVAL.as_secs()
        );

        if self.keymap.is_empty() {
            info!("Привязок нет, воспроизводить нечего");
            self.tx.closed().await;
            return Ok(());
        }

        for (hotkey, action) in self.keymap.bindings().iter().cycle() {
            sleep(REPLAY_INTERVAL).await;
            debug!("[DRY RUN] Нажата {} -> {}", hotkey, action);
            if self.tx.send(LauncherEvent::Hotkey(action.clone())).await.is_err() {
                break;
            }
        }

        info!("Канал событий закрыт, DryRunHotkeyListener завершает работу");
        Ok(())
    }
}

#[async_trait::async_trait]
impl HotkeyListenerTrait for DryRunHotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
