use crate::error::{HotlaunchError, Result};
use crate::events::{WindowId, WindowInfo, WindowType};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::process::Command;
use tracing::debug;

use super::r#trait::WindowSystem;

/// X11 через внешние утилиты: wmctrl (список, активация, закрытие),
/// xprop (фокус, порядок окон, тип окна) и xdotool (указатель)
pub struct X11WindowSystem {
    // Типы окон по результатам xprop, чистится в list_windows
    type_cache: Mutex<HashMap<WindowId, WindowType>>,
}

impl X11WindowSystem {
    pub fn new() -> Self {
        Self {
            type_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn test(&self) -> Result<()> {
        run("wmctrl", &["-m"]).map(|_| ())
    }

    fn window_type(&self, id: WindowId) -> WindowType {
        if let Some(&cached) = self.type_cache.lock().get(&id) {
            return cached;
        }

        let id_arg = id.to_string();
        let window_type = match run("xprop", &["-id", &id_arg, "_NET_WM_WINDOW_TYPE"]) {
            Ok(output) => parse_window_type(&output),
            Err(e) => {
                debug!("xprop не вернул тип окна {}: {}", id, e);
                WindowType::Normal
            }
        };

        self.type_cache.lock().insert(id, window_type);
        window_type
    }
}

impl Default for X11WindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for X11WindowSystem {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        let output = run("wmctrl", &["-lpx"])?;
        let mut windows = parse_wmctrl_list(&output);

        for window in &mut windows {
            window.window_type = self.window_type(window.id);
        }

        let alive: HashSet<WindowId> = windows.iter().map(|w| w.id).collect();
        self.type_cache.lock().retain(|id, _| alive.contains(id));

        Ok(windows)
    }

    fn focused_window(&self) -> Result<Option<WindowId>> {
        let output = run("xprop", &["-root", "_NET_ACTIVE_WINDOW"])?;
        Ok(parse_window_ids(&output).into_iter().next())
    }

    fn recent_windows(&self) -> Result<Vec<WindowId>> {
        // Порядок наложения снизу вверх: верхнее окно использовалось последним.
        // Приближение: без raise-on-focus у оконного менеджера порядок расходится с историей фокуса
        let output = run("xprop", &["-root", "_NET_CLIENT_LIST_STACKING"])?;
        let normal: HashSet<WindowId> = self
            .list_windows()?
            .into_iter()
            .filter(|w| w.window_type == WindowType::Normal)
            .map(|w| w.id)
            .collect();

        Ok(parse_window_ids(&output)
            .into_iter()
            .rev()
            .filter(|id| normal.contains(id))
            .collect())
    }

    fn activate(&self, id: WindowId) -> Result<()> {
        run("wmctrl", &["-ia", &id.to_string()]).map(|_| ())
    }

    fn center_pointer(&self, id: WindowId) -> Result<()> {
        let output = run("xdotool", &["getwindowgeometry", "--shell", &id.0.to_string()])?;
        let (x, y) = parse_geometry_center(&output).ok_or_else(|| {
            HotlaunchError::WindowSystem(format!("xdotool не вернул геометрию окна {}", id))
        })?;
        run("xdotool", &["mousemove", &x.to_string(), &y.to_string()]).map(|_| ())
    }

    fn close(&self, id: WindowId) -> Result<()> {
        run("wmctrl", &["-ic", &id.to_string()]).map(|_| ())
    }
}

fn run(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| HotlaunchError::WindowSystem(format!("{} не найден: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
        return Err(HotlaunchError::WindowSystem(format!(
            "{} вернул ошибку: {}",
            program,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Разобрать вывод `wmctrl -lpx`:
/// `0x03a00003  0 4242   Navigator.firefox     host Заголовок окна`
fn parse_wmctrl_list(output: &str) -> Vec<WindowInfo> {
    let mut windows = Vec::new();

    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(id), Some(_desktop), Some(pid), Some(wm_class), Some(_host)) =
            (fields.next(), fields.next(), fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        let Some(id) = parse_hex_id(id) else {
            debug!("wmctrl: не удалось разобрать строку '{}'", line);
            continue;
        };

        let title = fields.collect::<Vec<_>>().join(" ");
        let (_instance, class) = split_wm_class(wm_class);

        let mut window = WindowInfo::new(id, title).with_class(class.to_string());
        if !class.is_empty() && class != "N/A" {
            window = window.with_app_id(class);
        }
        if let Some(pid) = pid.parse::<u32>().ok().filter(|&pid| pid > 0) {
            window = window.with_pid(pid);
        }
        windows.push(window);
    }

    windows
}

/// WM_CLASS в выводе wmctrl - это `instance.Class`, причём обе части сами могут
/// содержать точки (`org.gnome.Nautilus.Org.gnome.Nautilus`)
fn split_wm_class(wm_class: &str) -> (&str, &str) {
    let middle = wm_class.len() / 2;
    if wm_class.len() % 2 == 1 && wm_class.is_char_boundary(middle) && wm_class[middle..].starts_with('.') {
        let (instance, class) = (&wm_class[..middle], &wm_class[middle + 1..]);
        if instance.eq_ignore_ascii_case(class) {
            return (instance, class);
        }
    }

    wm_class.rsplit_once('.').unwrap_or((wm_class, wm_class))
}

fn parse_hex_id(token: &str) -> Option<WindowId> {
    let hex = token.trim().trim_end_matches(',');
    let hex = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X"))?;
    u64::from_str_radix(hex, 16).ok().map(WindowId)
}

/// Идентификаторы из вывода xprop: `_NET_CLIENT_LIST_STACKING(WINDOW): window id # 0x1, 0x2`.
/// Нулевой идентификатор (нет активного окна) отбрасывается
fn parse_window_ids(output: &str) -> Vec<WindowId> {
    let Some((_, ids)) = output.split_once('#') else {
        return Vec::new();
    };

    ids.split(',')
        .filter_map(parse_hex_id)
        .filter(|id| id.0 != 0)
        .collect()
}

/// `_NET_WM_WINDOW_TYPE(ATOM) = _NET_WM_WINDOW_TYPE_DIALOG, _NET_WM_WINDOW_TYPE_NORMAL`.
/// Первый атом - основной; если свойства нет, окно считается обычным
fn parse_window_type(output: &str) -> WindowType {
    output
        .split_once('=')
        .and_then(|(_, atoms)| atoms.split(',').next())
        .map(WindowType::from_atom)
        .unwrap_or(WindowType::Normal)
}

/// Центр окна из `xdotool getwindowgeometry --shell`
fn parse_geometry_center(output: &str) -> Option<(i64, i64)> {
    let mut values: HashMap<&str, i64> = HashMap::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            if let Ok(value) = value.trim().parse() {
                values.insert(key.trim(), value);
            }
        }
    }

    let x = *values.get("X")?;
    let y = *values.get("Y")?;
    let width = *values.get("WIDTH")?;
    let height = *values.get("HEIGHT")?;
    Some((x + width / 2, y + height / 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wmctrl_list() {
        let output = "\
0x03a00003  0 4242   Navigator.firefox     host Mozilla Firefox — Start
0x02c0000a -1 1001   xfce4-panel.Xfce4-panel  host xfce4-panel
0x04400004  0 0      N/A                   host Без владельца
garbage line
";
        let windows = parse_wmctrl_list(output);
        assert_eq!(windows.len(), 3);

        assert_eq!(windows[0].id, WindowId(0x03a00003));
        assert_eq!(windows[0].title, "Mozilla Firefox — Start");
        assert_eq!(windows[0].class, "firefox");
        assert_eq!(windows[0].app_id.as_deref(), Some("firefox"));
        assert_eq!(windows[0].pid, Some(4242));

        assert_eq!(windows[1].app_id.as_deref(), Some("Xfce4-panel"));

        assert_eq!(windows[2].app_id, None);
        assert_eq!(windows[2].pid, None);
    }

    #[test]
    fn test_split_wm_class() {
        assert_eq!(split_wm_class("Navigator.firefox"), ("Navigator", "firefox"));
        assert_eq!(
            split_wm_class("org.gnome.Nautilus.Org.gnome.Nautilus"),
            ("org.gnome.Nautilus", "Org.gnome.Nautilus")
        );
        assert_eq!(split_wm_class("emacs"), ("emacs", "emacs"));
    }

    #[test]
    fn test_parse_window_ids() {
        let stacking = "_NET_CLIENT_LIST_STACKING(WINDOW): window id # 0x2c0000a, 0x3a00003, 0x4400004\n";
        assert_eq!(
            parse_window_ids(stacking),
            vec![WindowId(0x2c0000a), WindowId(0x3a00003), WindowId(0x4400004)]
        );

        let active = "_NET_ACTIVE_WINDOW(WINDOW): window id # 0x0\n";
        assert!(parse_window_ids(active).is_empty());

        assert!(parse_window_ids("_NET_ACTIVE_WINDOW:  not found.\n").is_empty());
    }

    #[test]
    fn test_parse_window_type() {
        assert_eq!(
            parse_window_type("_NET_WM_WINDOW_TYPE(ATOM) = _NET_WM_WINDOW_TYPE_DOCK\n"),
            WindowType::Dock
        );
        assert_eq!(
            parse_window_type("_NET_WM_WINDOW_TYPE(ATOM) = _NET_WM_WINDOW_TYPE_DIALOG, _NET_WM_WINDOW_TYPE_NORMAL\n"),
            WindowType::Dialog
        );
        assert_eq!(parse_window_type("_NET_WM_WINDOW_TYPE:  not found.\n"), WindowType::Normal);
    }

    #[test]
    fn test_parse_geometry_center() {
        let output = "WINDOW=60817411\nX=100\nY=50\nWIDTH=800\nHEIGHT=600\nSCREEN=0\n";
        assert_eq!(parse_geometry_center(output), Some((500, 350)));
        assert_eq!(parse_geometry_center("X=1\n"), None);
    }
}
