use crate::key_mapping::{ActionEvent, ActionMapping};
use xcb::x::ModMask;
use xkbcommon::xkb;

pub const BORDER_WIDTH: u32 = 1;

/// Windows are never resized below this many pixels on either axis.
pub const MIN_WINDOW_SIZE: i32 = 10;

/// Modifier held for all keybindings and for drag gestures.
pub const WM_MODIFIER: ModMask = ModMask::N4;

pub static TERMINAL_CMD: &[&str] = &["st"];
pub static BROWSER_CMD: &[&str] = &["mychromium"];
pub static LAUNCHER_CMD: &[&str] = &["dmenu_run"];
pub static VOLUME_MUTE_CMD: &[&str] = &["amixer", "-q", "set", "Master", "toggle"];
pub static VOLUME_DOWN_CMD: &[&str] = &["amixer", "-q", "set", "Master", "5%-", "unmute"];
pub static VOLUME_UP_CMD: &[&str] = &["amixer", "-q", "set", "Master", "5%+", "unmute"];
pub static BRIGHTNESS_DOWN_CMD: &[&str] = &["bri", "-"];
pub static BRIGHTNESS_UP_CMD: &[&str] = &["bri", "+"];

pub static ACTION_MAPPINGS: &[ActionMapping] = &[
    ActionMapping {
        key: xkb::Keysym::F1,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Quit,
    },
    ActionMapping {
        key: xkb::Keysym::Tab,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::FocusNext,
    },
    ActionMapping {
        key: xkb::Keysym::q,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::KillFocused,
    },
    ActionMapping {
        key: xkb::Keysym::m,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::MaximizeFocused,
    },
    ActionMapping {
        key: xkb::Keysym::t,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(TERMINAL_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::w,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(BROWSER_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::space,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(LAUNCHER_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::y,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(VOLUME_MUTE_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::u,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(VOLUME_DOWN_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::i,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(VOLUME_UP_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::o,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(BRIGHTNESS_DOWN_CMD),
    },
    ActionMapping {
        key: xkb::Keysym::p,
        modifiers: &[WM_MODIFIER],
        action: ActionEvent::Spawn(BRIGHTNESS_UP_CMD),
    },
];
