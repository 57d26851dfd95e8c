//! Идентификаторы приложений.
//!
//! Канонический идентификатор - имя desktop-файла с суффиксом `.desktop`
//! (`firefox_firefox.desktop`). Зарезервированный идентификатор [`OTHER_APP_ID`]
//! обозначает окна, не принадлежащие ни одному привязанному приложению.

/// Окна без привязанного приложения
pub const OTHER_APP_ID: &str = "other";

pub const DESKTOP_SUFFIX: &str = ".desktop";

/// Привести идентификатор к каноническому виду с суффиксом `.desktop`.
/// [`OTHER_APP_ID`] не меняется.
pub fn normalize_app_id(app_id: &str) -> String {
    let app_id = app_id.trim();
    if app_id == OTHER_APP_ID || app_id.ends_with(DESKTOP_SUFFIX) {
        app_id.to_string()
    } else {
        format!("{}{}", app_id, DESKTOP_SUFFIX)
    }
}

/// Ключ для нестрогого сравнения: без суффикса `.desktop`, без уточнения
/// в скобках (`Emacs (Client)` -> `emacs`), в нижнем регистре
pub fn match_key(app_id: &str) -> String {
    let base = app_id.trim();
    let base = base.strip_suffix(DESKTOP_SUFFIX).unwrap_or(base);

    let stripped = match base.find('(') {
        Some(open) => {
            let close = base.rfind(')').filter(|&close| close > open);
            let tail = close.map(|close| &base[close + 1..]).unwrap_or("");
            format!("{}{}", &base[..open], tail)
        }
        None => base.to_string(),
    };

    stripped.trim().to_lowercase()
}

/// Совпадение по вхождению подстроки в любую сторону (после [`match_key`]).
///
/// Эвристика: `firefox` совпадёт и с `firefox_firefox.desktop`, и с `firefox-esr.desktop`.
pub fn ids_match(reported: &str, bound: &str) -> bool {
    let reported = match_key(reported);
    let bound = match_key(bound);
    if reported.is_empty() || bound.is_empty() {
        return false;
    }
    reported.contains(&bound) || bound.contains(&reported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_appends_suffix() {
        assert_eq!(normalize_app_id("firefox_firefox"), "firefox_firefox.desktop");
        assert_eq!(normalize_app_id("firefox_firefox.desktop"), "firefox_firefox.desktop");
        assert_eq!(normalize_app_id(" org.gnome.Terminal "), "org.gnome.Terminal.desktop");
    }

    #[test]
    fn normalize_keeps_other_sentinel() {
        assert_eq!(normalize_app_id(OTHER_APP_ID), OTHER_APP_ID);
    }

    #[test]
    fn normalize_is_idempotent() {
        for id in ["firefox", "emacs.desktop", "other", "", "  spaced  ", ".desktop", "Emacs (Client)"] {
            let once = normalize_app_id(id);
            assert_eq!(normalize_app_id(&once), once, "id: {:?}", id);
        }
    }

    #[test]
    fn match_key_strips_suffix_and_qualifier() {
        assert_eq!(match_key("Emacs (Client).desktop"), "emacs");
        assert_eq!(match_key("emacs.desktop"), "emacs");
        assert_eq!(match_key("Foo (beta) Edition"), "foo  edition");
        assert_eq!(match_key("Broken (qualifier"), "broken");
    }

    #[test]
    fn ids_match_in_both_directions() {
        assert!(ids_match("firefox", "firefox_firefox.desktop"));
        assert!(ids_match("firefox_firefox.desktop", "Firefox"));
        assert!(ids_match("Emacs (Client)", "emacs.desktop"));
        assert!(!ids_match("gimp", "firefox_firefox.desktop"));
        assert!(!ids_match("(only qualifier)", "firefox.desktop"));
    }
}
