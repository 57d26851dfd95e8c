use crate::bindings::Keymap;
use crate::config::Settings;
use crate::error::Result;
use crate::events::LauncherEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Source of hotkey actions for the dispatcher
#[async_trait::async_trait]
pub trait HotkeyListenerTrait {
    /// Run until the event channel is closed or the device fails
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate hotkey listener based on the dry_run flag
pub fn create_hotkey_listener(
    settings: &Settings,
    keymap: Arc<Keymap>,
    tx: mpsc::Sender<LauncherEvent>,
    dry_run: bool,
) -> Result<Box<dyn HotkeyListenerTrait + Send>> {
    if dry_run {
        Ok(Box::new(super::dry_hotkey_listener::DryRunHotkeyListener::new(
            keymap, tx,
        )))
    } else {
        Ok(Box::new(super::keyboard_listener::RealHotkeyListener::new(
            &settings.input.device_path,
            keymap,
            tx,
        )?))
    }
}
