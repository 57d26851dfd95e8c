mod dry_hotkey_listener;
mod keyboard_listener;
pub mod keymap;
mod modifier_state;
mod r#trait;

pub use self::r#trait::create_hotkey_listener;
