use xcb::x;
use xcb::Connection;

/// ICCCM WM_STATE values persisted on managed windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmState {
    Normal,
    Iconic,
}

impl WmState {
    pub const fn value(self) -> u32 {
        match self {
            WmState::Normal => 1,
            WmState::Iconic => 3,
        }
    }
}

pub struct Atoms {
    pub wm_state: x::Atom,
    pub wm_change_state: x::Atom,
}

impl Atoms {
    pub fn initialize(conn: &Connection) -> Self {
        Self {
            wm_state: Self::intern_atom(conn, "WM_STATE"),
            wm_change_state: Self::intern_atom(conn, "WM_CHANGE_STATE"),
        }
    }

    fn intern_atom(conn: &Connection, name: &str) -> x::Atom {
        let cookie = conn.send_request(&x::InternAtom {
            only_if_exists: false,
            name: name.as_bytes(),
        });
        conn.wait_for_reply(cookie)
            .expect("If interning atoms fails we don't want to start the WM")
            .atom()
    }
}
