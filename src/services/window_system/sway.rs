use crate::error::{HotlaunchError, Result};
use crate::events::{WindowId, WindowInfo, WindowType};
use serde_json::Value;
use std::process::Command;
use tracing::debug;

use super::r#trait::WindowSystem;

/// sway через swaymsg: дерево контейнеров в JSON и команды с критерием `[con_id=N]`
pub struct SwayWindowSystem;

impl SwayWindowSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn test(&self) -> Result<()> {
        swaymsg(&["-t", "get_version"]).map(|_| ())
    }

    fn tree(&self) -> Result<SwayTree> {
        let output = swaymsg(&["-t", "get_tree"])?;
        SwayTree::parse(&output)
    }

    fn command(&self, id: WindowId, command: &str) -> Result<()> {
        let criteria = format!("[con_id={}] {}", id.0, command);
        let output = swaymsg(&[criteria.as_str()])?;

        // swaymsg возвращает массив результатов: [{"success": false, "error": "..."}]
        let results: Value = serde_json::from_str(&output)?;
        let failed = results
            .as_array()
            .map(|results| results.iter().any(|r| r["success"] == Value::Bool(false)))
            .unwrap_or(false);

        if failed {
            return Err(HotlaunchError::WindowSystem(format!(
                "swaymsg '{}' не выполнен: {}",
                criteria,
                output.trim()
            )));
        }
        Ok(())
    }
}

impl Default for SwayWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for SwayWindowSystem {
    fn name(&self) -> &'static str {
        "sway"
    }

    fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        Ok(self.tree()?.windows())
    }

    fn focused_window(&self) -> Result<Option<WindowId>> {
        Ok(self.tree()?.focused())
    }

    fn recent_windows(&self) -> Result<Vec<WindowId>> {
        Ok(self.tree()?.recent())
    }

    fn activate(&self, id: WindowId) -> Result<()> {
        self.command(id, "focus")
    }

    fn center_pointer(&self, id: WindowId) -> Result<()> {
        let (x, y) = self
            .tree()?
            .center_of(id)
            .ok_or_else(|| HotlaunchError::WindowSystem(format!("окно {} не найдено в дереве sway", id)))?;

        swaymsg(&["seat", "-", "cursor", "set", &x.to_string(), &y.to_string()]).map(|_| ())
    }

    fn close(&self, id: WindowId) -> Result<()> {
        self.command(id, "kill")
    }
}

fn swaymsg(args: &[&str]) -> Result<String> {
    let output = Command::new("swaymsg")
        .args(args)
        .output()
        .map_err(|e| HotlaunchError::WindowSystem(format!("swaymsg не найден: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("swaymsg {:?} вернул ошибку: {}", args, stderr.trim());
        return Err(HotlaunchError::WindowSystem(format!(
            "swaymsg вернул ошибку: {}",
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Дерево контейнеров sway (`swaymsg -t get_tree`)
struct SwayTree {
    root: Value,
}

impl SwayTree {
    fn parse(json: &str) -> Result<Self> {
        Ok(Self {
            root: serde_json::from_str(json)?,
        })
    }

    /// Окна в порядке обхода дерева
    fn windows(&self) -> Vec<WindowInfo> {
        let mut windows = Vec::new();
        visit(&self.root, false, &mut |node| {
            if let Some(window) = window_from_node(node) {
                windows.push(window);
            }
        });
        windows
    }

    fn focused(&self) -> Option<WindowId> {
        let mut focused = None;
        visit(&self.root, false, &mut |node| {
            if is_window(node) && node["focused"].as_bool() == Some(true) {
                focused = node_id(node);
            }
        });
        focused
    }

    /// Окна по недавности фокуса: у каждого контейнера массив `focus`
    /// перечисляет детей от последнего получившего фокус
    fn recent(&self) -> Vec<WindowId> {
        let mut recent = Vec::new();
        visit(&self.root, true, &mut |node| {
            if let Some(window) = window_from_node(node) {
                if window.window_type == WindowType::Normal {
                    recent.push(window.id);
                }
            }
        });
        recent
    }

    fn center_of(&self, id: WindowId) -> Option<(i64, i64)> {
        let mut center = None;
        visit(&self.root, false, &mut |node| {
            if node_id(node) == Some(id) {
                let rect = &node["rect"];
                let (x, y) = (rect["x"].as_i64()?, rect["y"].as_i64()?);
                let (width, height) = (rect["width"].as_i64()?, rect["height"].as_i64()?);
                center = Some((x + width / 2, y + height / 2));
            }
            Some(())
        });
        center
    }
}

/// Обход в глубину. При `by_focus` дети идут в порядке массива `focus`
fn visit<F, R>(node: &Value, by_focus: bool, f: &mut F)
where
    F: FnMut(&Value) -> R,
{
    f(node);

    let mut children: Vec<&Value> = ["nodes", "floating_nodes"]
        .iter()
        .filter_map(|key| node[*key].as_array())
        .flatten()
        .collect();

    if by_focus {
        if let Some(order) = node["focus"].as_array() {
            let rank = |child: &&Value| {
                order
                    .iter()
                    .position(|id| id.as_u64().is_some() && id.as_u64() == child["id"].as_u64())
                    .unwrap_or(usize::MAX)
            };
            children.sort_by_key(rank);
        }
    }

    for child in children {
        visit(child, by_focus, f);
    }
}

fn node_id(node: &Value) -> Option<WindowId> {
    node["id"].as_u64().map(WindowId)
}

/// Окно - это лист с pid (у рабочих столов и выходов pid нет)
fn is_window(node: &Value) -> bool {
    let leaf = node["nodes"].as_array().map_or(true, |n| n.is_empty());
    matches!(node["type"].as_str(), Some("con") | Some("floating_con"))
        && leaf
        && node["pid"].as_u64().is_some()
}

fn window_from_node(node: &Value) -> Option<WindowInfo> {
    if !is_window(node) {
        return None;
    }

    let id = node_id(node)?;
    let title = node["name"].as_str().unwrap_or_default().to_string();

    // Нативные wayland окна сообщают app_id, XWayland - WM_CLASS
    let app_id = node["app_id"]
        .as_str()
        .or_else(|| node["window_properties"]["class"].as_str())
        .filter(|s| !s.is_empty());

    // XWayland без _NET_WM_WINDOW_TYPE отдаёт "unknown"
    let window_type = node["window_type"]
        .as_str()
        .filter(|t| *t != "unknown")
        .map(WindowType::from_atom)
        .unwrap_or(WindowType::Normal);

    let mut window = WindowInfo::new(id, title)
        .with_class(app_id.unwrap_or_default().to_string())
        .with_type(window_type);
    if let Some(app_id) = app_id {
        window = window.with_app_id(app_id);
    }
    if let Some(pid) = node["pid"].as_u64() {
        window = window.with_pid(pid as u32);
    }
    Some(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
      "id": 1, "type": "root", "focus": [3],
      "nodes": [{
        "id": 3, "type": "output", "name": "eDP-1", "focus": [4],
        "nodes": [{
          "id": 4, "type": "workspace", "name": "1", "focus": [12, 10, 11],
          "rect": {"x": 0, "y": 0, "width": 1920, "height": 1080},
          "nodes": [
            {"id": 10, "type": "con", "name": "Firefox", "app_id": "firefox", "pid": 100,
             "focused": false, "nodes": [], "rect": {"x": 0, "y": 0, "width": 960, "height": 1080}},
            {"id": 11, "type": "con", "name": "emacs@host", "app_id": null, "pid": 200,
             "window_properties": {"class": "Emacs"}, "window_type": "normal",
             "focused": false, "nodes": [], "rect": {"x": 960, "y": 0, "width": 960, "height": 1080}}
          ],
          "floating_nodes": [
            {"id": 12, "type": "floating_con", "name": "Terminal", "app_id": "foot", "pid": 300,
             "focused": true, "nodes": [], "rect": {"x": 100, "y": 100, "width": 400, "height": 300}}
          ]
        }]
      }]
    }"#;

    #[test]
    fn test_windows_in_tree_order() {
        let tree = SwayTree::parse(TREE).unwrap();
        let windows = tree.windows();

        let ids: Vec<u64> = windows.iter().map(|w| w.id.0).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(windows[0].app_id.as_deref(), Some("firefox"));
        assert_eq!(windows[1].app_id.as_deref(), Some("Emacs"));
        assert_eq!(windows[2].pid, Some(300));
    }

    #[test]
    fn test_focused_and_recent() {
        let tree = SwayTree::parse(TREE).unwrap();
        assert_eq!(tree.focused(), Some(WindowId(12)));
        assert_eq!(tree.recent(), vec![WindowId(12), WindowId(10), WindowId(11)]);
    }

    #[test]
    fn test_center_of() {
        let tree = SwayTree::parse(TREE).unwrap();
        assert_eq!(tree.center_of(WindowId(11)), Some((1440, 540)));
        assert_eq!(tree.center_of(WindowId(99)), None);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(SwayTree::parse("not json").is_err());
    }
}
