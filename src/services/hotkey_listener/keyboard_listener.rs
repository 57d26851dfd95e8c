use crate::bindings::{Action, Keymap};
use crate::error::{HotlaunchError, Result};
use crate::events::{KeyCode, KeyEvent, KeyState, LauncherEvent};
use crate::utils::DeviceFinder;
use crate::debug_if_enabled;
use evdev::{Device, EventType};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::modifier_state::ModifierState;
use super::r#trait::HotkeyListenerTrait;

/// Сопоставляет поток evdev событий с таблицей горячих клавиш
pub struct HotkeyMatcher {
    keymap: Arc<Keymap>,
    modifier_state: ModifierState,
}

impl HotkeyMatcher {
    pub fn new(keymap: Arc<Keymap>) -> Self {
        Self {
            keymap,
            modifier_state: ModifierState::new(),
        }
    }

    /// Обработать одно событие клавиши. Действие возвращается только на нажатие
    /// (без автоповтора) привязанной комбинации
    pub fn feed(&mut self, code: u16, value: i32) -> Option<Action> {
        let state = match KeyState::from_evdev_value(value) {
            Some(state) => state,
            None => {
                debug!("Неизвестное значение события: {}", value);
                return None;
            }
        };

        if self
            .modifier_state
            .update_key(evdev::KeyCode::new(code), state != KeyState::Released)
        {
            return None;
        }

        if state != KeyState::Pressed {
            return None;
        }

        let event = KeyEvent::new(KeyCode(code), state, self.modifier_state.to_modifiers());
        debug_if_enabled!("Событие клавиши: {}", event);

        self.keymap.action_for(&event.hotkey()).cloned()
    }
}

/// Читает клавиатуру через evdev без захвата устройства:
/// нажатия по-прежнему доходят до остальных приложений
pub struct RealHotkeyListener {
    device: Device,
    keymap: Arc<Keymap>,
    tx: mpsc::Sender<LauncherEvent>,
}

impl RealHotkeyListener {
    pub fn new(device_path: &str, keymap: Arc<Keymap>, tx: mpsc::Sender<LauncherEvent>) -> Result<Self> {
        info!("Инициализация RealHotkeyListener");

        let device_path = DeviceFinder::find_keyboard_device(device_path)?;
        let device = Device::open(&device_path).map_err(|e| {
            HotlaunchError::DeviceNotFound(format!(
                "Не удалось открыть устройство {:?}: {}",
                device_path, e
            ))
        })?;

        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());

        Ok(Self { device, keymap, tx })
    }

    async fn run_impl(self) -> Result<()> {
        info!("RealHotkeyListener запущен, {} привязок", self.keymap.len());
        for (hotkey, action) in self.keymap.bindings() {
            debug!("  {} -> {}", hotkey, action);
        }

        let (done_tx, done_rx) = oneshot::channel();

        // fetch_events блокируется до следующего события, поэтому чтение идёт
        // в отдельном потоке, а не в задаче runtime
        std::thread::Builder::new()
            .name("hotkey-reader".to_string())
            .spawn(move || {
                let result = Self::read_loop(self.device, HotkeyMatcher::new(self.keymap), self.tx);
                let _ = done_tx.send(result);
            })?;

        done_rx.await.map_err(|_| {
            HotlaunchError::Internal("Поток чтения клавиатуры завершился аварийно".to_string())
        })?
    }

    fn read_loop(
        mut device: Device,
        mut matcher: HotkeyMatcher,
        tx: mpsc::Sender<LauncherEvent>,
    ) -> Result<()> {
        loop {
            let events: Vec<_> = match device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) => {
                    error!("Ошибка чтения событий: {}", e);
                    return Err(HotlaunchError::Io(e));
                }
            };

            for event in events {
                if event.event_type() != EventType::KEY {
                    continue;
                }

                let Some(action) = matcher.feed(event.code(), event.value()) else {
                    continue;
                };

                info!("Горячая клавиша -> {}", action);
                if tx.blocking_send(LauncherEvent::Hotkey(action)).is_err() {
                    warn!("Канал событий закрыт, чтение клавиатуры остановлено");
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl HotkeyListenerTrait for RealHotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
