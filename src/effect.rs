use xcb::x::{StackMode, Window};

use crate::atoms::WmState;

/// Geometry/stacking changes requested by a client, forwarded verbatim.
/// Only the fields present in the request's value mask are `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfigureChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
    pub sibling: Option<Window>,
    pub stack_mode: Option<StackMode>,
}

/// A server-side command requested by the state machine. The state machine
/// never talks to the server directly; it returns these and `X11` applies
/// them, which keeps every transition testable without a display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Map(Window),
    Unmap(Window),
    Focus(Window),
    Raise(Window),
    Move {
        window: Window,
        x: i32,
        y: i32,
    },
    Resize {
        window: Window,
        w: u32,
        h: u32,
    },
    MoveResize {
        window: Window,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
    },
    SetBorder {
        window: Window,
        pixel: u32,
        width: u32,
    },
    SetWmState {
        window: Window,
        state: WmState,
    },
    /// Ask for EnterNotify on a managed window (focus-follows-mouse).
    SelectEnter(Window),
    /// Sync-pointer Button1 grab used for click-to-focus.
    GrabClicks(Window),
    KillClient(Window),
    /// Release a frozen click-to-focus press back to the client.
    ReplayPointer,
    ConfigureForward {
        window: Window,
        changes: ConfigureChanges,
    },
}
