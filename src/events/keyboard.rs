use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::services::hotkey_listener::keymap::KeyNames;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    /// Значение evdev события: 0 - отпускание, 1 - нажатие, 2 - автоповтор
    pub fn from_evdev_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeyNames::name_of(self.0) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KEY_{}", self.0),
        }
    }
}

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_alt(mut self, alt: bool) -> Self {
        self.alt = alt;
        self
    }

    pub fn with_super(mut self, super_key: bool) -> Self {
        self.super_key = super_key;
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.super_key
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        if self.super_key { result.push("super"); }
        result
    }

    /// Включить модификатор по имени. Возвращает false для неизвестного имени
    fn set_by_name(&mut self, name: &str) -> bool {
        match name {
            "ctrl" | "control" => self.ctrl = true,
            "alt" => self.alt = true,
            "shift" => self.shift = true,
            "super" | "meta" | "win" => self.super_key = true,
            _ => return false,
        }
        true
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Горячая клавиша: набор модификаторов + одна обычная клавиша.
///
/// Текстовая форма: `f9`, `super+f`, `ctrl+alt+t` (регистр не важен).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: KeyCode,
}

impl Hotkey {
    pub fn new(modifiers: Modifiers, key: KeyCode) -> Self {
        Self { modifiers, key }
    }
}

impl FromStr for Hotkey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err("пустая горячая клавиша".to_string());
        }

        let mut parts: Vec<&str> = normalized.split('+').map(str::trim).collect();
        let key_name = parts.pop().unwrap_or_default();
        if key_name.is_empty() {
            return Err(format!("нет основной клавиши в '{}'", s));
        }

        let mut modifiers = Modifiers::new();
        for part in parts {
            if !modifiers.set_by_name(part) {
                return Err(format!("неизвестный модификатор '{}' в '{}'", part, s));
            }
        }

        let code = KeyNames::code_of(key_name)
            .ok_or_else(|| format!("неизвестная клавиша '{}' в '{}'", key_name, s))?;
        if KeyNames::is_modifier(code) {
            return Err(format!("'{}' - модификатор, а не основная клавиша", key_name));
        }

        Ok(Self::new(modifiers, KeyCode(code)))
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key)
        }
    }
}

/// Событие клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    pub modifiers: Modifiers,
    pub timestamp: std::time::Instant,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState, modifiers: Modifiers) -> Self {
        Self {
            key_code,
            state,
            modifiers,
            timestamp: std::time::Instant::now(),
        }
    }

    /// Горячая клавиша, которую образует это событие
    pub fn hotkey(&self) -> Hotkey {
        Hotkey::new(self.modifiers, self.key_code)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} ({}ms)",
            self.hotkey(),
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}
