//! Файл привязок горячих клавиш.
//!
//! Построчный текстовый формат: пустые строки и строки, начинающиеся с `#`,
//! пропускаются; значимая строка делится по пробелам на 1-3 токена:
//!
//! ```text
//! launch  <клавиша> <приложение>
//! win_other  <клавиша>
//! win_delete <клавиша>
//! win_prev   <клавиша>
//! win_center_mouse
//! ```
//!
//! Ошибочные строки пропускаются с предупреждением, в котором указан номер строки.

use crate::error::Result;
use crate::hotlaunch_error;
use crate::events::Hotkey;
use crate::launcher::ident::normalize_app_id;
use smallvec::SmallVec;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_BINDINGS: &str = "\
# Привязки hotlaunch
#
# launch <клавиша> <приложение>   - запустить приложение или переключиться на его окна
# win_other <клавиша>             - перебирать окна, не привязанные ни к одному приложению
# win_prev <клавиша>              - вернуться к предыдущему окну
# win_delete <клавиша>            - закрыть окно в фокусе
# win_center_mouse                - переносить указатель в центр окна при переключении
#
# Клавиша: f9, super+f, ctrl+alt+t. Приложение: имя .desktop файла,
# суффикс .desktop можно опустить.
#
# launch f9 firefox_firefox.desktop
# launch super+t org.gnome.Terminal
win_prev super+grave
win_other super+o
win_delete super+q
";

/// Одна запись файла привязок
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEntry {
    Launch { key: String, app: String },
    WinOther { key: String },
    WinDelete { key: String },
    WinPrev { key: String },
    WinCenterMouse,
}

/// Предупреждение о пропущенной строке (номер строки начинается с 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingWarning {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for BindingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "строка {}: {}", self.line, self.message)
    }
}

/// Результат разбора файла привязок
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBindings {
    pub entries: Vec<ConfigEntry>,
    pub warnings: Vec<BindingWarning>,
}

/// Действие, выполняемое по горячей клавише
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Запустить приложение или переключиться на его окна
    Launch(String),
    /// Перебирать окна, не принадлежащие привязанным приложениям
    CycleOther,
    /// Закрыть окно в фокусе
    DeleteFocused,
    /// Вернуться к предыдущему окну
    PreviousWindow,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Launch(app) => write!(f, "launch {}", app),
            Action::CycleOther => write!(f, "win_other"),
            Action::DeleteFocused => write!(f, "win_delete"),
            Action::PreviousWindow => write!(f, "win_prev"),
        }
    }
}

/// Готовая таблица горячих клавиш
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<(Hotkey, Action)>,
    pub center_mouse: bool,
}

impl Keymap {
    /// Действие для горячей клавиши; при дубликатах побеждает первая привязка
    pub fn action_for(&self, hotkey: &Hotkey) -> Option<&Action> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == hotkey)
            .map(|(_, action)| action)
    }

    pub fn bindings(&self) -> &[(Hotkey, Action)] {
        &self.bindings
    }

    /// Нормализованные идентификаторы приложений с привязкой launch,
    /// без повторов и в порядке файла привязок
    pub fn bound_app_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (_, action) in &self.bindings {
            if let Action::Launch(app) = action {
                let id = normalize_app_id(app);
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Разобрать текст файла привязок
pub fn parse_bindings(text: &str) -> ParsedBindings {
    let mut parsed = ParsedBindings::default();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: SmallVec<[&str; 4]> = line.split_whitespace().collect();
        match parse_entry(&tokens) {
            Ok(entry) => {
                debug!("Строка {}: {:?}", line_no, entry);
                parsed.entries.push(entry);
            }
            Err(message) => {
                warn!("Пропущена строка {} файла привязок: {} ('{}')", line_no, message, line);
                parsed.warnings.push(BindingWarning { line: line_no, message });
            }
        }
    }

    parsed
}

fn parse_entry(tokens: &[&str]) -> std::result::Result<ConfigEntry, String> {
    if tokens.is_empty() || tokens.len() > 3 {
        return Err(format!("ожидается от 1 до 3 токенов, получено {}", tokens.len()));
    }

    let key = || tokens[1].to_string();
    match (tokens[0], tokens.len()) {
        ("launch", 3) => Ok(ConfigEntry::Launch { key: key(), app: tokens[2].to_string() }),
        ("win_other", 2) => Ok(ConfigEntry::WinOther { key: key() }),
        ("win_delete", 2) => Ok(ConfigEntry::WinDelete { key: key() }),
        ("win_prev", 2) => Ok(ConfigEntry::WinPrev { key: key() }),
        ("win_center_mouse", 1) => Ok(ConfigEntry::WinCenterMouse),
        ("launch" | "win_other" | "win_delete" | "win_prev" | "win_center_mouse", n) => {
            Err(format!("неверное число аргументов для '{}': {}", tokens[0], n - 1))
        }
        (action, _) => Err(format!("неизвестное действие '{}'", action)),
    }
}

impl ParsedBindings {
    /// Превратить записи в таблицу горячих клавиш. Нераспознанные клавиши пропускаются
    pub fn into_keymap(self) -> Keymap {
        let mut keymap = Keymap::default();

        for entry in self.entries {
            let (key, action) = match entry {
                ConfigEntry::Launch { key, app } => (key, Action::Launch(app)),
                ConfigEntry::WinOther { key } => (key, Action::CycleOther),
                ConfigEntry::WinDelete { key } => (key, Action::DeleteFocused),
                ConfigEntry::WinPrev { key } => (key, Action::PreviousWindow),
                ConfigEntry::WinCenterMouse => {
                    keymap.center_mouse = true;
                    continue;
                }
            };

            let hotkey = match key.parse::<Hotkey>() {
                Ok(hotkey) => hotkey,
                Err(e) => {
                    warn!("Привязка '{}' пропущена: {}", action, e);
                    continue;
                }
            };

            if keymap.action_for(&hotkey).is_some() {
                warn!("Клавиша {} уже привязана, '{}' игнорируется", hotkey, action);
                continue;
            }

            keymap.bindings.push((hotkey, action));
        }

        keymap
    }
}

/// Прочитать файл привязок, создав файл по умолчанию, если его нет.
///
/// Невозможность прочитать или создать файл - фатальная ошибка запуска.
pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<ParsedBindings> {
    let path = path.as_ref();

    if !path.exists() {
        info!("Файл привязок {:?} не найден, создаём файл по умолчанию", path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                hotlaunch_error!(bindings, "Не удалось создать каталог {:?}: {}", parent, e)
            })?;
        }
        fs::write(path, DEFAULT_BINDINGS).map_err(|e| {
            hotlaunch_error!(bindings, "Не удалось создать {:?}: {}", path, e)
        })?;
    }

    let text = fs::read_to_string(path)
        .map_err(|e| hotlaunch_error!(bindings, "Не удалось прочитать {:?}: {}", path, e))?;

    let parsed = parse_bindings(&text);
    info!(
        "Файл привязок {:?}: {} записей, {} пропущено",
        path,
        parsed.entries.len(),
        parsed.warnings.len()
    );
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HotlaunchError;

    #[test]
    fn test_parse_launch_line() {
        let parsed = parse_bindings("launch f9 firefox_firefox.desktop");
        assert_eq!(
            parsed.entries,
            vec![ConfigEntry::Launch {
                key: "f9".to_string(),
                app: "firefox_firefox.desktop".to_string(),
            }]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_parse_center_mouse_line() {
        let parsed = parse_bindings("win_center_mouse");
        assert_eq!(parsed.entries, vec![ConfigEntry::WinCenterMouse]);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let text = "# комментарий\n\n   \n  # ещё один\nwin_prev super+grave\n";
        let parsed = parse_bindings(text);
        assert_eq!(parsed.entries, vec![ConfigEntry::WinPrev { key: "super+grave".to_string() }]);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_too_many_tokens_warns_with_line_number() {
        let text = "win_other f1\n\nlaunch f9 firefox extra\nwin_delete f4";
        let parsed = parse_bindings(text);

        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].line, 3);
        assert!(parsed.warnings[0].to_string().contains("строка 3"));
    }

    #[test]
    fn test_unknown_action_and_wrong_arity() {
        let parsed = parse_bindings("frobnicate f1\nlaunch f9\nwin_center_mouse f2");
        assert!(parsed.entries.is_empty());
        let lines: Vec<usize> = parsed.warnings.iter().map(|w| w.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_into_keymap() {
        let text = "launch f9 firefox_firefox.desktop\nwin_other super+o\nwin_center_mouse\nwin_prev bogus+key";
        let keymap = parse_bindings(text).into_keymap();

        assert!(keymap.center_mouse);
        assert_eq!(keymap.len(), 2);
        assert_eq!(
            keymap.action_for(&"f9".parse().unwrap()),
            Some(&Action::Launch("firefox_firefox.desktop".to_string()))
        );
        assert_eq!(keymap.action_for(&"super+o".parse().unwrap()), Some(&Action::CycleOther));
        assert_eq!(keymap.action_for(&"f10".parse().unwrap()), None);
    }

    #[test]
    fn test_duplicate_hotkey_keeps_first() {
        let keymap = parse_bindings("launch f9 firefox\nlaunch f9 emacs").into_keymap();
        assert_eq!(keymap.len(), 1);
        assert_eq!(
            keymap.action_for(&"f9".parse().unwrap()),
            Some(&Action::Launch("firefox".to_string()))
        );
    }

    #[test]
    fn test_bound_app_ids_are_normalized() {
        let keymap = parse_bindings(
            "launch f9 firefox\nlaunch f10 emacs.desktop\nwin_other f11\nlaunch f12 firefox.desktop",
        )
        .into_keymap();

        assert_eq!(keymap.bound_app_ids(), vec!["firefox.desktop", "emacs.desktop"]);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bindings.conf");

        let parsed = load_or_create(&path).unwrap();
        assert!(path.exists());
        assert!(parsed.warnings.is_empty());
        assert!(parsed.entries.contains(&ConfigEntry::WinOther { key: "super+o".to_string() }));

        // Повторная загрузка читает уже существующий файл
        fs::write(&path, "win_center_mouse\n").unwrap();
        let parsed = load_or_create(&path).unwrap();
        assert_eq!(parsed.entries, vec![ConfigEntry::WinCenterMouse]);
    }

    #[test]
    fn test_default_bindings_parse_into_keymap() {
        let keymap = parse_bindings(DEFAULT_BINDINGS).into_keymap();
        assert_eq!(keymap.len(), 3);
        assert!(!keymap.center_mouse);
    }

    #[test]
    fn test_unwritable_bindings_location_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("hotlaunch");
        fs::write(&blocker, "не каталог").unwrap();

        let result = load_or_create(blocker.join("bindings.conf"));
        assert!(matches!(result, Err(HotlaunchError::Bindings(_))));
    }
}
