use xcb::x::ModMask;
use xkbcommon::xkb::Keysym;

pub struct ActionMapping {
    pub key: Keysym,
    pub modifiers: &'static [ModMask],
    pub action: ActionEvent,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    Quit,
    FocusNext,
    KillFocused,
    MaximizeFocused,
    Spawn(&'static [&'static str]),
}
