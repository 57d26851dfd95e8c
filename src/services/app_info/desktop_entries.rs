use crate::error::Result;
use crate::hotlaunch_error;
use std::fs;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::{AppInfoService, DesktopApp};

/// Поиск и запуск приложений по desktop-файлам из каталогов XDG
pub struct DesktopEntries {
    dirs: Vec<PathBuf>,
}

impl DesktopEntries {
    pub fn new() -> Self {
        let dirs = default_application_dirs();
        debug!("Каталоги desktop-файлов: {:?}", dirs);
        Self::with_dirs(dirs)
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Пути, по которым может лежать desktop-файл: `kde-konsole.desktop`
    /// допускается и как `kde/konsole.desktop`
    fn candidates(&self, app_id: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        for dir in &self.dirs {
            candidates.push(dir.join(app_id));
            if app_id.contains('-') {
                candidates.push(dir.join(app_id.replacen('-', "/", 1)));
            }
        }
        candidates
    }
}

impl Default for DesktopEntries {
    fn default() -> Self {
        Self::new()
    }
}

impl AppInfoService for DesktopEntries {
    fn lookup(&self, app_id: &str) -> Option<DesktopApp> {
        for path in self.candidates(app_id) {
            let Ok(text) = fs::read_to_string(&path) else {
                continue;
            };

            match parse_desktop_entry(app_id, &text) {
                Some(mut app) => {
                    debug!("Найдено приложение {} в {:?}", app_id, path);
                    app.path = Some(path);
                    return Some(app);
                }
                None => debug!("{:?} не подходит для запуска", path),
            }
        }
        None
    }

    fn launch(&self, app: &DesktopApp) -> Result<()> {
        let command = if app.terminal {
            let terminal = std::env::var("TERMINAL").unwrap_or_else(|_| "xterm".to_string());
            format!("{} -e {}", terminal, app.command)
        } else {
            app.command.clone()
        };

        info!("Запуск {}: {}", app.id, command);

        // sh сразу завершается, приложение остаётся работать в фоне.
        // Своя группа процессов - чтобы Ctrl+C демона не доставался приложению
        let status = Command::new("sh")
            .arg("-c")
            .arg(format!("{} >/dev/null 2>&1 &", command))
            .stdin(Stdio::null())
            .process_group(0)
            .status()
            .map_err(|e| hotlaunch_error!(launch, "{}: {}", app.id, e))?;

        if !status.success() {
            return Err(hotlaunch_error!(launch, "{}: sh завершился с {}", app.id, status));
        }
        Ok(())
    }
}

fn default_application_dirs() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    match dirs::data_dir() {
        Some(data_home) => roots.push(data_home),
        None => debug!("Каталог данных пользователя не определён, только системные каталоги"),
    }

    let data_dirs = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
    roots.extend(data_dirs.split(':').filter(|d| !d.is_empty()).map(PathBuf::from));

    let mut dirs: Vec<PathBuf> = roots.into_iter().map(|d| d.join("applications")).collect();

    // snap кладёт свои desktop-файлы отдельно
    let snap = PathBuf::from("/var/lib/snapd/desktop/applications");
    if !dirs.contains(&snap) {
        dirs.push(snap);
    }

    dirs
}

/// Разобрать группу `[Desktop Entry]`. Скрытые записи и записи без `Exec` не подходят
fn parse_desktop_entry(app_id: &str, text: &str) -> Option<DesktopApp> {
    let mut in_entry = false;
    let mut name = None;
    let mut exec = None;
    let mut terminal = false;
    let mut hidden = false;
    let mut entry_type = None;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "Name" => name = Some(unescape_value(value)),
            "Exec" => exec = Some(unescape_value(value)),
            "Terminal" => terminal = value == "true",
            "Hidden" => hidden = value == "true",
            "Type" => entry_type = Some(value.to_string()),
            _ => {}
        }
    }

    if hidden || entry_type.as_deref().is_some_and(|t| t != "Application") {
        return None;
    }

    let command = strip_field_codes(&exec?);
    if command.is_empty() {
        return None;
    }

    Some(DesktopApp {
        id: app_id.to_string(),
        name: name.unwrap_or_else(|| app_id.trim_end_matches(".desktop").to_string()),
        command,
        terminal,
        path: None,
    })
}

const FIELD_CODES: &[char] = &['f', 'F', 'u', 'U', 'd', 'D', 'n', 'N', 'i', 'c', 'k', 'v', 'm'];

/// Общие escape-последовательности значений: `\s`, `\n`, `\t`, `\r`, `\\`.
/// Остальные (например `\"` в Exec) остаются для разбора командой
fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Убрать коды полей (`%f`, `%U`, `%i`, ...) из строки Exec, в том числе внутри
/// аргументов (`--url=%u`); `%%` превращается в `%`
fn strip_field_codes(exec: &str) -> String {
    exec.split_whitespace()
        .map(strip_codes_in_token)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_codes_in_token(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(code) if FIELD_CODES.contains(&code) => {
                chars.next();
            }
            _ => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str = "\
[Desktop Entry]
Version=1.0
Type=Application
Name=Firefox Web Browser
Name[ru]=Веб-браузер Firefox
Exec=env BAMF_DESKTOP_FILE_HINT=/var/lib/snapd/desktop/applications/firefox_firefox.desktop /snap/bin/firefox %u
Terminal=false

[Desktop Action new-window]
Name=New Window
Exec=/snap/bin/firefox --new-window
";

    #[test]
    fn test_parse_desktop_entry() {
        let app = parse_desktop_entry("firefox_firefox.desktop", FIREFOX).unwrap();
        assert_eq!(app.name, "Firefox Web Browser");
        assert!(app.command.ends_with("/snap/bin/firefox"));
        assert!(!app.terminal);
    }

    #[test]
    fn test_hidden_and_non_application_entries_are_skipped() {
        let hidden = "[Desktop Entry]\nType=Application\nExec=foo\nHidden=true\n";
        assert!(parse_desktop_entry("foo.desktop", hidden).is_none());

        let link = "[Desktop Entry]\nType=Link\nURL=https://example.com\n";
        assert!(parse_desktop_entry("link.desktop", link).is_none());

        let no_exec = "[Desktop Entry]\nType=Application\nName=Nothing\n";
        assert!(parse_desktop_entry("nothing.desktop", no_exec).is_none());
    }

    #[test]
    fn test_strip_field_codes() {
        assert_eq!(strip_field_codes("gimp-2.10 %U"), "gimp-2.10");
        assert_eq!(strip_field_codes("app --icon %i --name %c %f"), "app --icon --name");
        assert_eq!(strip_field_codes("printf 100%%"), "printf 100%");
    }

    #[test]
    fn test_field_codes_inside_arguments_are_stripped() {
        assert_eq!(strip_field_codes("browser --url=%u --profile=work"), "browser --url= --profile=work");
        assert_eq!(strip_field_codes("viewer -f%F"), "viewer -f");
        assert_eq!(strip_field_codes("tool --rate=50%% %X"), "tool --rate=50% %X");
    }

    #[test]
    fn test_escaped_values_are_decoded() {
        let entry = "[Desktop Entry]\nType=Application\nName=My\\sEditor\nExec=editor\\s--new-window=%u\n";
        let app = parse_desktop_entry("editor.desktop", entry).unwrap();
        assert_eq!(app.name, "My Editor");
        assert_eq!(app.command, "editor --new-window=");

        assert_eq!(unescape_value(r"a\\b\tc"), "a\\b\tc");
        assert_eq!(unescape_value(r#"sh -c \"x\""#), r#"sh -c \"x\""#);
    }

    #[test]
    fn test_lookup_in_directories() {
        let dir = tempfile::tempdir().unwrap();
        let apps = dir.path().join("applications");
        fs::create_dir_all(apps.join("kde")).unwrap();
        fs::write(apps.join("firefox_firefox.desktop"), FIREFOX).unwrap();
        fs::write(
            apps.join("kde").join("konsole.desktop"),
            "[Desktop Entry]\nType=Application\nName=Konsole\nExec=konsole\n",
        )
        .unwrap();

        let entries = DesktopEntries::with_dirs(vec![dir.path().join("missing"), apps.clone()]);

        let firefox = entries.lookup("firefox_firefox.desktop").unwrap();
        assert_eq!(firefox.id, "firefox_firefox.desktop");
        assert_eq!(firefox.path, Some(apps.join("firefox_firefox.desktop")));

        let konsole = entries.lookup("kde-konsole.desktop").unwrap();
        assert_eq!(konsole.command, "konsole");

        assert!(entries.lookup("absent.desktop").is_none());
    }

    #[test]
    fn test_launch_does_not_wait_for_the_app() {
        let entries = DesktopEntries::with_dirs(Vec::new());
        let app = DesktopApp {
            id: "sleeper.desktop".to_string(),
            name: "Sleeper".to_string(),
            command: "sleep 5".to_string(),
            terminal: false,
            path: None,
        };

        let started = std::time::Instant::now();
        entries.launch(&app).unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(4));
    }
}
