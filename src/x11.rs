use log::{error, warn};
use xcb::{
    x::{self, EventMask, ModMask, Window},
    Connection, ProtocolError, VoidCookieChecked, Xid,
};

use crate::atoms::{Atoms, WmState};
use crate::effect::{ConfigureChanges, Effect};
use crate::monitor::Rect;

/// Root-relative window geometry as reported by the server.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

/// Owns the single connection to the X server. Everything the state
/// machine requests arrives here as an `Effect`; everything it needs to
/// know is exposed as a best-effort query that returns `None` when the
/// window in question has already gone away.
pub struct X11 {
    conn: Connection,
    root: Window,
    atoms: Atoms,
}

impl X11 {
    pub fn new(conn: Connection, root: Window, atoms: Atoms) -> Self {
        Self { conn, root, atoms }
    }

    pub const fn root(&self) -> Window {
        self.root
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub const fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn wait_for_event(&self) -> xcb::Result<xcb::Event> {
        self.conn.wait_for_event()
    }

    pub fn flush(&self) -> xcb::Result<()> {
        self.conn.flush().map_err(Into::into)
    }

    /// Fire-and-forget application, used on the pointer-motion hot path.
    pub fn apply_effects_unchecked(&self, effects: &[Effect]) {
        for effect in effects {
            self.send_effect_unchecked(effect);
        }

        if let Err(e) = self.flush() {
            error!("Failed to flush X connection: {e:?}");
        }
    }

    /// Checked application: every request's error is fetched and logged.
    /// Failures are expected when a window died under us and are not fatal.
    pub fn apply_effects_checked(&self, effects: &[Effect]) {
        let mut pending_checks: Vec<(VoidCookieChecked, String)> = Vec::new();

        for effect in effects {
            let effect_dbg = format!("{effect:?}");
            for cookie in self.send_effect_checked(effect) {
                pending_checks.push((cookie, effect_dbg.clone()));
            }
        }

        if let Err(e) = self.flush() {
            error!("Failed to flush X connection: {e:?}");
        }

        for (cookie, effect_dbg) in pending_checks {
            if let Err(e) = self.conn.check_request(cookie) {
                error!("X error applying {effect_dbg}: {e:?}");
            }
        }
    }

    fn send_effect_unchecked(&self, effect: &Effect) {
        match effect {
            Effect::Map(window) => {
                self.conn.send_request(&x::MapWindow { window: *window });
            }
            Effect::Unmap(window) => {
                self.conn.send_request(&x::UnmapWindow { window: *window });
            }
            Effect::Focus(window) => {
                self.conn.send_request(&self.focus_request(*window));
            }
            Effect::Raise(window) => {
                self.conn.send_request(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::StackMode(x::StackMode::Above)],
                });
            }
            Effect::Move { window, x, y } => {
                self.conn.send_request(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::X(*x), x::ConfigWindow::Y(*y)],
                });
            }
            Effect::Resize { window, w, h } => {
                self.conn.send_request(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::Width(*w), x::ConfigWindow::Height(*h)],
                });
            }
            Effect::MoveResize { window, x, y, w, h } => {
                self.conn.send_request(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[
                        x::ConfigWindow::X(*x),
                        x::ConfigWindow::Y(*y),
                        x::ConfigWindow::Width(*w),
                        x::ConfigWindow::Height(*h),
                    ],
                });
            }
            Effect::SetBorder {
                window,
                pixel,
                width,
            } => {
                self.conn.send_request(&x::ChangeWindowAttributes {
                    window: *window,
                    value_list: &[x::Cw::BorderPixel(*pixel)],
                });
                self.conn.send_request(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::BorderWidth(*width)],
                });
            }
            Effect::SetWmState { window, state } => {
                self.conn
                    .send_request(&self.wm_state_request(*window, *state));
            }
            Effect::SelectEnter(window) => {
                self.conn.send_request(&x::ChangeWindowAttributes {
                    window: *window,
                    value_list: &[x::Cw::EventMask(EventMask::ENTER_WINDOW)],
                });
            }
            Effect::GrabClicks(window) => {
                self.conn.send_request(&self.grab_clicks_request(*window));
            }
            Effect::KillClient(window) => {
                self.conn.send_request(&x::KillClient {
                    resource: window.resource_id(),
                });
            }
            Effect::ReplayPointer => {
                self.conn.send_request(&x::AllowEvents {
                    mode: x::Allow::ReplayPointer,
                    time: x::CURRENT_TIME,
                });
            }
            Effect::ConfigureForward { window, changes } => {
                self.conn.send_request(&x::ConfigureWindow {
                    window: *window,
                    value_list: &Self::configure_values(changes),
                });
            }
        }
    }

    fn send_effect_checked(&self, effect: &Effect) -> Vec<VoidCookieChecked> {
        match effect {
            Effect::Map(window) => {
                vec![self
                    .conn
                    .send_request_checked(&x::MapWindow { window: *window })]
            }
            Effect::Unmap(window) => {
                vec![self
                    .conn
                    .send_request_checked(&x::UnmapWindow { window: *window })]
            }
            Effect::Focus(window) => {
                vec![self.conn.send_request_checked(&self.focus_request(*window))]
            }
            Effect::Raise(window) => {
                vec![self.conn.send_request_checked(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::StackMode(x::StackMode::Above)],
                })]
            }
            Effect::Move { window, x, y } => {
                vec![self.conn.send_request_checked(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::X(*x), x::ConfigWindow::Y(*y)],
                })]
            }
            Effect::Resize { window, w, h } => {
                vec![self.conn.send_request_checked(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::Width(*w), x::ConfigWindow::Height(*h)],
                })]
            }
            Effect::MoveResize { window, x, y, w, h } => {
                vec![self.conn.send_request_checked(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[
                        x::ConfigWindow::X(*x),
                        x::ConfigWindow::Y(*y),
                        x::ConfigWindow::Width(*w),
                        x::ConfigWindow::Height(*h),
                    ],
                })]
            }
            Effect::SetBorder {
                window,
                pixel,
                width,
            } => {
                let a = self.conn.send_request_checked(&x::ChangeWindowAttributes {
                    window: *window,
                    value_list: &[x::Cw::BorderPixel(*pixel)],
                });
                let b = self.conn.send_request_checked(&x::ConfigureWindow {
                    window: *window,
                    value_list: &[x::ConfigWindow::BorderWidth(*width)],
                });
                vec![a, b]
            }
            Effect::SetWmState { window, state } => {
                vec![self
                    .conn
                    .send_request_checked(&self.wm_state_request(*window, *state))]
            }
            Effect::SelectEnter(window) => {
                vec![self.conn.send_request_checked(&x::ChangeWindowAttributes {
                    window: *window,
                    value_list: &[x::Cw::EventMask(EventMask::ENTER_WINDOW)],
                })]
            }
            Effect::GrabClicks(window) => {
                vec![self
                    .conn
                    .send_request_checked(&self.grab_clicks_request(*window))]
            }
            Effect::KillClient(window) => {
                vec![self.conn.send_request_checked(&x::KillClient {
                    resource: window.resource_id(),
                })]
            }
            Effect::ReplayPointer => {
                vec![self.conn.send_request_checked(&x::AllowEvents {
                    mode: x::Allow::ReplayPointer,
                    time: x::CURRENT_TIME,
                })]
            }
            Effect::ConfigureForward { window, changes } => {
                vec![self.conn.send_request_checked(&x::ConfigureWindow {
                    window: *window,
                    value_list: &Self::configure_values(changes),
                })]
            }
        }
    }

    fn focus_request(&self, window: Window) -> x::SetInputFocus {
        x::SetInputFocus {
            revert_to: x::InputFocus::PointerRoot,
            focus: window,
            time: x::CURRENT_TIME,
        }
    }

    fn wm_state_request(&self, window: Window, state: WmState) -> x::ChangeProperty<'static, u32> {
        x::ChangeProperty {
            mode: x::PropMode::Replace,
            window,
            property: self.atoms.wm_state,
            r#type: self.atoms.wm_state,
            data: match state {
                WmState::Normal => &[1, 0],
                WmState::Iconic => &[3, 0],
            },
        }
    }

    /// Sync-pointer grab so a click-to-focus press can be replayed to the
    /// client after we raise and focus it.
    fn grab_clicks_request(&self, window: Window) -> x::GrabButton {
        x::GrabButton {
            owner_events: true,
            grab_window: window,
            event_mask: EventMask::BUTTON_PRESS,
            pointer_mode: x::GrabMode::Sync,
            keyboard_mode: x::GrabMode::Async,
            confine_to: Window::none(),
            cursor: x::Cursor::none(),
            button: x::ButtonIndex::N1,
            modifiers: ModMask::ANY,
        }
    }

    fn configure_values(changes: &ConfigureChanges) -> Vec<x::ConfigWindow> {
        let mut values = Vec::new();
        if let Some(v) = changes.x {
            values.push(x::ConfigWindow::X(v));
        }
        if let Some(v) = changes.y {
            values.push(x::ConfigWindow::Y(v));
        }
        if let Some(v) = changes.width {
            values.push(x::ConfigWindow::Width(v));
        }
        if let Some(v) = changes.height {
            values.push(x::ConfigWindow::Height(v));
        }
        if let Some(v) = changes.border_width {
            values.push(x::ConfigWindow::BorderWidth(v));
        }
        if let Some(v) = changes.sibling {
            values.push(x::ConfigWindow::Sibling(v));
        }
        if let Some(v) = changes.stack_mode {
            values.push(x::ConfigWindow::StackMode(v));
        }
        values
    }

    /// Becoming the window manager: only one client may hold the
    /// substructure-redirect mask, so this failing means another WM runs.
    pub fn set_root_event_mask(&self) -> Result<(), ProtocolError> {
        let values = [x::Cw::EventMask(
            EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::STRUCTURE_NOTIFY,
        )];
        self.conn
            .send_and_check_request(&x::ChangeWindowAttributes {
                window: self.root,
                value_list: &values,
            })
    }

    /// Left-pointer cursor on the root, from the classic cursor glyph font.
    pub fn define_root_cursor(&self) {
        let font: x::Font = self.conn.generate_id();
        self.conn.send_request(&x::OpenFont {
            fid: font,
            name: b"cursor",
        });
        let cursor: x::Cursor = self.conn.generate_id();
        self.conn.send_request(&x::CreateGlyphCursor {
            cid: cursor,
            source_font: font,
            mask_font: font,
            source_char: 68, // XC_left_ptr
            mask_char: 69,
            fore_red: 0,
            fore_green: 0,
            fore_blue: 0,
            back_red: 0xffff,
            back_green: 0xffff,
            back_blue: 0xffff,
        });
        if let Err(e) = self
            .conn
            .send_and_check_request(&x::ChangeWindowAttributes {
                window: self.root,
                value_list: &[x::Cw::Cursor(cursor)],
            })
        {
            warn!("Failed to set root cursor: {e:?}");
        }
    }

    /// Root grabs that start move/resize drags: Button1 with the manager
    /// modifier, plus Shift for resize.
    pub fn grab_drag_buttons(&self, modifier: ModMask) {
        for modifiers in [modifier, modifier | ModMask::SHIFT] {
            if let Err(e) = self.conn.send_and_check_request(&x::GrabButton {
                owner_events: true,
                grab_window: self.root,
                event_mask: EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::POINTER_MOTION,
                pointer_mode: x::GrabMode::Async,
                keyboard_mode: x::GrabMode::Async,
                confine_to: Window::none(),
                cursor: x::Cursor::none(),
                button: x::ButtonIndex::N1,
                modifiers,
            }) {
                warn!("Failed to grab drag button with {modifiers:?}: {e:?}");
            }
        }
    }

    pub fn query_tree_children(&self) -> Vec<Window> {
        let cookie = self.conn.send_request(&x::QueryTree { window: self.root });
        match self.conn.wait_for_reply(cookie) {
            Ok(reply) => reply.children().to_vec(),
            Err(e) => {
                warn!("Failed to query window tree: {e:?}");
                vec![]
            }
        }
    }

    /// Whether a window is currently viewable and participating in
    /// redirection. `None` when the window vanished before we asked.
    pub fn is_manageable(&self, window: Window) -> Option<bool> {
        let cookie = self.conn.send_request(&x::GetWindowAttributes { window });
        let reply = self.conn.wait_for_reply(cookie).ok()?;
        Some(reply.map_state() == x::MapState::Viewable && !reply.override_redirect())
    }

    pub fn window_geometry(&self, window: Window) -> Option<Geometry> {
        let cookie = self.conn.send_request(&x::GetGeometry {
            drawable: x::Drawable::Window(window),
        });
        let reply = self.conn.wait_for_reply(cookie).ok()?;
        Some(Geometry {
            x: reply.x() as i32,
            y: reply.y() as i32,
            w: reply.width() as u32,
            h: reply.height() as u32,
        })
    }

    /// The window currently holding input focus, or `None` when focus is
    /// on the root, on PointerRoot, or nowhere.
    pub fn focused_window(&self) -> Option<Window> {
        let cookie = self.conn.send_request(&x::GetInputFocus {});
        let reply = self.conn.wait_for_reply(cookie).ok()?;
        let focus = reply.focus();
        // resource ids 0 and 1 encode None and PointerRoot
        if focus == self.root || focus.resource_id() <= 1 {
            return None;
        }
        Some(focus)
    }

    pub fn translate_to_root(&self, window: Window) -> Option<(i32, i32)> {
        let cookie = self.conn.send_request(&x::TranslateCoordinates {
            src_window: window,
            dst_window: self.root,
            src_x: 0,
            src_y: 0,
        });
        let reply = self.conn.wait_for_reply(cookie).ok()?;
        Some((reply.dst_x() as i32, reply.dst_y() as i32))
    }

    /// Live Xinerama topology; empty when the extension is missing or the
    /// query fails, in which case callers fall back to the full screen.
    pub fn monitors(&self) -> Vec<Rect> {
        let cookie = self.conn.send_request(&xcb::xinerama::QueryScreens {});
        match self.conn.wait_for_reply(cookie) {
            Ok(reply) => reply
                .screen_info()
                .iter()
                .map(|info| Rect {
                    x: info.x_org as i32,
                    y: info.y_org as i32,
                    w: info.width as u32,
                    h: info.height as u32,
                })
                .collect(),
            Err(e) => {
                warn!("Xinerama query failed, falling back to full screen: {e:?}");
                vec![]
            }
        }
    }
}
