use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Маппинг между именами клавиш в файле привязок и кодами evdev
pub struct KeyNames;

// Статическая карта поддерживаемых клавиш
static KEY_NAME_TO_CODE: Lazy<HashMap<&'static str, u16>> = Lazy::new(|| {
    let mut map = HashMap::new();

    // Буквенные клавиши
    let letters: [(&str, u16); 26] = [
        ("a", 30), ("b", 48), ("c", 46), ("d", 32), ("e", 18), ("f", 33),
        ("g", 34), ("h", 35), ("i", 23), ("j", 36), ("k", 37), ("l", 38),
        ("m", 50), ("n", 49), ("o", 24), ("p", 25), ("q", 16), ("r", 19),
        ("s", 31), ("t", 20), ("u", 22), ("v", 47), ("w", 17), ("x", 45),
        ("y", 21), ("z", 44),
    ];
    map.extend(letters);

    // Цифровые клавиши (верхний ряд)
    map.extend([
        ("1", 2), ("2", 3), ("3", 4), ("4", 5), ("5", 6),
        ("6", 7), ("7", 8), ("8", 9), ("9", 10), ("0", 11),
    ]);

    // Функциональные клавиши: F1-F10 идут подряд, F11/F12 отдельно
    map.extend([
        ("f1", 59), ("f2", 60), ("f3", 61), ("f4", 62), ("f5", 63), ("f6", 64),
        ("f7", 65), ("f8", 66), ("f9", 67), ("f10", 68), ("f11", 87), ("f12", 88),
    ]);

    // Специальные клавиши
    map.insert("space", 57);      // KEY_SPACE
    map.insert("enter", 28);      // KEY_ENTER
    map.insert("escape", 1);      // KEY_ESC
    map.insert("backspace", 14);  // KEY_BACKSPACE
    map.insert("tab", 15);        // KEY_TAB
    map.insert("grave", 41);      // KEY_GRAVE
    map.insert("minus", 12);      // KEY_MINUS
    map.insert("equal", 13);      // KEY_EQUAL
    map.insert("print", 99);      // KEY_SYSRQ

    // Навигация
    map.insert("up", 103);
    map.insert("down", 108);
    map.insert("left", 105);
    map.insert("right", 106);
    map.insert("home", 102);
    map.insert("end", 107);
    map.insert("pageup", 104);
    map.insert("pagedown", 109);
    map.insert("insert", 110);
    map.insert("delete", 111);

    // Модификаторы (левые)
    map.insert("ctrl", 29);       // KEY_LEFTCTRL
    map.insert("alt", 56);        // KEY_LEFTALT
    map.insert("shift", 42);      // KEY_LEFTSHIFT
    map.insert("super", 125);     // KEY_LEFTMETA

    map
});

static CODE_TO_KEY_NAME: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    let mut map: HashMap<u16, &'static str> =
        KEY_NAME_TO_CODE.iter().map(|(&name, &code)| (code, name)).collect();

    // Правые модификаторы называются так же, как левые
    map.insert(97, "ctrl");
    map.insert(100, "alt");
    map.insert(54, "shift");
    map.insert(126, "super");

    map
});

impl KeyNames {
    /// Получить код клавиши по её имени (регистр не важен)
    pub fn code_of(key_name: &str) -> Option<u16> {
        let normalized = key_name.to_lowercase();
        KEY_NAME_TO_CODE.get(normalized.as_str()).copied()
    }

    /// Получить имя клавиши по её коду
    pub fn name_of(code: u16) -> Option<&'static str> {
        CODE_TO_KEY_NAME.get(&code).copied()
    }

    /// Проверить, является ли код модификатором
    pub fn is_modifier(code: u16) -> bool {
        matches!(code, 29 | 97 | 56 | 100 | 42 | 54 | 125 | 126)
    }
}
