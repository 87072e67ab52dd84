//! Global keyboard shortcuts
//!
//! Two shortcuts are reserved at the top level, before any widget sees the
//! key: modifier+K toggles the command palette and Escape closes it. Every
//! other key passes through to whatever has focus, so typing into a form
//! field is never intercepted.
//!
//! Bindings are strings like `"ctrl-k"` and can be changed in the
//! `[keybinds]` config section.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::store::AppStore;

/// Shortcut that acts on the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    TogglePalette,
    ClosePalette,
}

/// Routing decision for one key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    /// Consumed by a global shortcut
    Global(GlobalAction),
    /// Deliver to the focused widget
    PassThrough,
}

/// Key strings for the global shortcuts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeybindConfig {
    #[serde(default = "default_toggle")]
    pub toggle_palette: Vec<String>,
    #[serde(default = "default_close")]
    pub close_palette: Vec<String>,
}

fn default_toggle() -> Vec<String> {
    vec!["ctrl-k".to_string(), "super-k".to_string()]
}

fn default_close() -> Vec<String> {
    vec!["esc".to_string()]
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            toggle_palette: default_toggle(),
            close_palette: default_close(),
        }
    }
}

/// Parse a key string like `"ctrl-k"` into a `KeyEvent`
///
/// Returns `None` for unknown key names.
#[must_use]
pub fn parse_key_string(s: &str) -> Option<KeyEvent> {
    let parts: Vec<&str> = s.split('-').collect();
    let key_part = parts.last()?;

    let mut modifiers = KeyModifiers::NONE;
    for part in &parts[..parts.len().saturating_sub(1)] {
        match part.to_lowercase().as_str() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "alt" => modifiers |= KeyModifiers::ALT,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "super" | "cmd" | "meta" => modifiers |= KeyModifiers::SUPER,
            _ => return None,
        }
    }

    let code = match key_part.to_lowercase().as_str() {
        "enter" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "bspace" | "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "space" => KeyCode::Char(' '),
        s if s.starts_with('f') && s.len() > 1 => s[1..].parse().ok().map(KeyCode::F)?,
        s if s.chars().count() == 1 => KeyCode::Char(s.chars().next()?),
        _ => return None,
    };

    Some(KeyEvent::new(code, modifiers))
}

/// Compare ignoring letter case and the shift that produces it
fn same_key(a: &KeyEvent, b: &KeyEvent) -> bool {
    match (a.code, b.code) {
        (KeyCode::Char(x), KeyCode::Char(y)) => {
            x.eq_ignore_ascii_case(&y)
                && a.modifiers.difference(KeyModifiers::SHIFT)
                    == b.modifiers.difference(KeyModifiers::SHIFT)
        }
        (x, y) => x == y && a.modifiers == b.modifiers,
    }
}

/// Decides which key events are global shortcuts
#[derive(Debug, Clone)]
pub struct KeyRouter {
    toggle: Vec<KeyEvent>,
    close: Vec<KeyEvent>,
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::from_config(&KeybindConfig::default())
    }
}

impl KeyRouter {
    /// Build from config, skipping (and logging) unparsable bindings
    #[must_use]
    pub fn from_config(config: &KeybindConfig) -> Self {
        let parse = |binds: &[String]| -> Vec<KeyEvent> {
            binds
                .iter()
                .filter_map(|bind| {
                    let key = parse_key_string(bind);
                    if key.is_none() {
                        log::warn!("ignoring unknown key binding '{bind}'");
                    }
                    key
                })
                .collect()
        };
        Self {
            toggle: parse(&config.toggle_palette),
            close: parse(&config.close_palette),
        }
    }

    /// Route `key` given whether the palette is open
    #[must_use]
    pub fn route(&self, key: &KeyEvent, palette_open: bool) -> KeyRoute {
        if self.toggle.iter().any(|bound| same_key(bound, key)) {
            return KeyRoute::Global(GlobalAction::TogglePalette);
        }

        // Escape belongs to a form field unless the palette is on top of it
        if palette_open && self.close.iter().any(|bound| same_key(bound, key)) {
            return KeyRoute::Global(GlobalAction::ClosePalette);
        }

        KeyRoute::PassThrough
    }

    /// Route `key` and apply any global action to `store`
    ///
    /// Returns the route so the caller knows whether to forward the key.
    pub fn dispatch(&self, key: &KeyEvent, store: &mut AppStore) -> KeyRoute {
        let route = self.route(key, store.state().command_palette_open);
        match route {
            KeyRoute::Global(GlobalAction::TogglePalette) => store.toggle_command_palette(),
            KeyRoute::Global(GlobalAction::ClosePalette) => store.set_command_palette_open(false),
            KeyRoute::PassThrough => {}
        }
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_parse_key_string() {
        assert_eq!(
            parse_key_string("ctrl-k"),
            Some(key(KeyCode::Char('k'), KeyModifiers::CONTROL))
        );
        assert_eq!(
            parse_key_string("super-k"),
            Some(key(KeyCode::Char('k'), KeyModifiers::SUPER))
        );
        assert_eq!(parse_key_string("esc"), Some(key(KeyCode::Esc, KeyModifiers::NONE)));
        assert_eq!(parse_key_string("f5"), Some(key(KeyCode::F(5), KeyModifiers::NONE)));
        assert_eq!(parse_key_string("hyper-k"), None);
        assert_eq!(parse_key_string("nonsense"), None);
    }

    #[test]
    fn test_modifier_k_toggles_everywhere() {
        let router = KeyRouter::default();
        let ctrl_k = key(KeyCode::Char('k'), KeyModifiers::CONTROL);
        let cmd_k = key(KeyCode::Char('K'), KeyModifiers::SUPER | KeyModifiers::SHIFT);

        for open in [false, true] {
            assert_eq!(
                router.route(&ctrl_k, open),
                KeyRoute::Global(GlobalAction::TogglePalette)
            );
            assert_eq!(
                router.route(&cmd_k, open),
                KeyRoute::Global(GlobalAction::TogglePalette)
            );
        }
    }

    #[test]
    fn test_plain_typing_passes_through() {
        let router = KeyRouter::default();
        let plain_k = key(KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(router.route(&plain_k, true), KeyRoute::PassThrough);
        assert_eq!(router.route(&plain_k, false), KeyRoute::PassThrough);
        let enter = key(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(router.route(&enter, false), KeyRoute::PassThrough);
    }

    #[test]
    fn test_escape_only_when_palette_open() {
        let router = KeyRouter::default();
        let esc = key(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(
            router.route(&esc, true),
            KeyRoute::Global(GlobalAction::ClosePalette)
        );
        // a closed palette leaves Escape to form fields
        assert_eq!(router.route(&esc, false), KeyRoute::PassThrough);
    }

    #[test]
    fn test_dispatch_updates_store() {
        let router = KeyRouter::default();
        let mut store = AppStore::new();
        let ctrl_k = key(KeyCode::Char('k'), KeyModifiers::CONTROL);
        let esc = key(KeyCode::Esc, KeyModifiers::NONE);

        router.dispatch(&ctrl_k, &mut store);
        assert!(store.state().command_palette_open);
        router.dispatch(&esc, &mut store);
        assert!(!store.state().command_palette_open);
        router.dispatch(&ctrl_k, &mut store);
        router.dispatch(&ctrl_k, &mut store);
        assert!(!store.state().command_palette_open);
    }

    #[test]
    fn test_custom_bindings() {
        let config = KeybindConfig {
            toggle_palette: vec!["alt-p".into(), "bogus-binding-x".into()],
            close_palette: vec!["ctrl-c".into()],
        };
        let router = KeyRouter::from_config(&config);
        assert_eq!(
            router.route(&key(KeyCode::Char('p'), KeyModifiers::ALT), false),
            KeyRoute::Global(GlobalAction::TogglePalette)
        );
        assert_eq!(
            router.route(&key(KeyCode::Char('k'), KeyModifiers::CONTROL), false),
            KeyRoute::PassThrough
        );
    }
}
