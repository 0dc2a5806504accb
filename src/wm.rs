use log::{debug, info};
use std::collections::HashMap;
use xcb::{
    x::{self, KeyButMask, ModMask},
    Connection, Xid,
};

use crate::atoms::{Atoms, WmState};
use crate::config::WM_MODIFIER;
use crate::effect::{ConfigureChanges, Effect};
use crate::key_mapping::ActionEvent;
use crate::keyboard;
use crate::launcher;
use crate::state::{DragMode, ScreenConfig, State};
use crate::x11::X11;

pub struct WindowManager {
    x11: X11,
    state: State,
    key_bindings: HashMap<(u8, ModMask), ActionEvent>,
}

impl WindowManager {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let (conn, screen_num) = Connection::connect(None)?;
        info!("Connected to X.");

        let screen = conn
            .get_setup()
            .roots()
            .nth(screen_num as usize)
            .expect("Cannot find root screen");
        let root = screen.root();
        let screen_config = ScreenConfig {
            width: screen.width_in_pixels() as u32,
            height: screen.height_in_pixels() as u32,
            border_pixel: screen.black_pixel(),
        };

        let atoms = Atoms::initialize(&conn);
        let x11 = X11::new(conn, root, atoms);

        // Failing here means another window manager is already running.
        x11.set_root_event_mask()?;
        info!("Successfully set substructure redirect");

        x11.define_root_cursor();

        let (keysyms, keysyms_per_keycode) = keyboard::fetch_keyboard_mapping(x11.connection());
        let key_bindings =
            keyboard::populate_key_bindings(x11.connection(), &keysyms, keysyms_per_keycode);
        keyboard::set_keygrabs(x11.connection(), &key_bindings, root);
        x11.grab_drag_buttons(WM_MODIFIER);

        let mut wm = WindowManager {
            x11,
            state: State::new(screen_config),
            key_bindings,
        };
        wm.scan_existing_windows();

        Ok(wm)
    }

    /// Seeds the registry with the top-level windows that existed before we
    /// started, skipping override-redirect and non-viewable ones.
    fn scan_existing_windows(&mut self) {
        for window in self.x11.query_tree_children() {
            if self.x11.is_manageable(window) == Some(true) {
                info!("Managing pre-existing window {window:?}");
                let effects = self.state.manage(window);
                self.x11.apply_effects_checked(&effects);
            }
        }
    }

    pub fn run(&mut self) -> xcb::Result<()> {
        loop {
            match self.x11.wait_for_event()? {
                xcb::Event::X(x::Event::KeyPress(ev)) => {
                    debug!("Received KeyPress event: {ev:?}");
                    if self.handle_key_press(&ev) {
                        info!("Quit action invoked, shutting down");
                        return Ok(());
                    }
                }

                xcb::Event::X(x::Event::MapRequest(ev)) => {
                    debug!("Received MapRequest for window: {:?}", ev.window());
                    let effects = self.state.on_map_request(ev.window());
                    self.x11.apply_effects_checked(&effects);
                }

                xcb::Event::X(x::Event::DestroyNotify(ev)) => {
                    debug!("Received DestroyNotify for window {:?}", ev.window());
                    let effects = self.state.on_destroy(ev.window());
                    self.x11.apply_effects_checked(&effects);
                }

                xcb::Event::X(x::Event::UnmapNotify(ev)) => {
                    debug!("Received UnmapNotify for window {:?}", ev.window());
                    let effects = self.state.on_unmap(ev.window());
                    self.x11.apply_effects_checked(&effects);
                }

                xcb::Event::X(x::Event::ButtonPress(ev)) => {
                    debug!("Received ButtonPress event: {ev:?}");
                    self.handle_button_press(&ev);
                }

                xcb::Event::X(x::Event::MotionNotify(ev)) => {
                    let effects = self.state.on_motion(ev.root_x() as i32, ev.root_y() as i32);
                    self.x11.apply_effects_unchecked(&effects);
                }

                xcb::Event::X(x::Event::ButtonRelease(_)) => {
                    let effects = self.state.end_drag();
                    self.x11.apply_effects_checked(&effects);
                }

                xcb::Event::X(x::Event::EnterNotify(ev)) => {
                    if ev.event() != self.x11.root() {
                        let effects = self.state.on_enter(ev.event());
                        self.x11.apply_effects_checked(&effects);
                    }
                }

                xcb::Event::X(x::Event::ConfigureRequest(ev)) => {
                    debug!("Received ConfigureRequest for window {:?}", ev.window());
                    let changes = Self::requested_changes(&ev);
                    let effects = self.state.on_configure_request(ev.window(), changes);
                    self.x11.apply_effects_checked(&effects);
                }

                xcb::Event::X(x::Event::ClientMessage(ev)) => {
                    self.handle_client_message(&ev);
                }

                ev => {
                    debug!("Ignoring event: {ev:?}");
                }
            }
        }
    }

    /// Returns true when the bound action is Quit.
    fn handle_key_press(&mut self, ev: &x::KeyPressEvent) -> bool {
        let keycode = ev.detail();
        let modifiers = ModMask::from_bits_truncate(ev.state().bits());

        let Some(action) = self.key_bindings.get(&(keycode, modifiers)).copied() else {
            debug!("No binding for keycode {keycode} with modifiers {modifiers:?}");
            return false;
        };

        match action {
            ActionEvent::Quit => return true,
            ActionEvent::FocusNext => {
                let effects = self.state.focus_next();
                self.x11.apply_effects_checked(&effects);
            }
            ActionEvent::KillFocused => self.kill_focused(),
            ActionEvent::MaximizeFocused => self.maximize_focused(),
            ActionEvent::Spawn(argv) => {
                // launch failures are logged and otherwise invisible
                let _ = launcher::spawn(argv);
            }
        }
        false
    }

    fn kill_focused(&mut self) {
        let Some(focused) = self.x11.focused_window() else {
            debug!("Kill requested with no focused client");
            return;
        };
        info!("Killing client window: {focused:?}");
        self.x11.apply_effects_checked(&[Effect::KillClient(focused)]);
    }

    fn maximize_focused(&mut self) {
        let Some(focused) = self.x11.focused_window() else {
            debug!("Maximize requested with no focused client");
            return;
        };
        let Some(origin) = self.x11.translate_to_root(focused) else {
            return;
        };
        let monitors = self.x11.monitors();
        let effects = self.state.maximize(focused, origin, &monitors);
        self.x11.apply_effects_checked(&effects);
    }

    /// Two cases: a press over a child window with the drag modifier held
    /// (our root grabs) starts a drag; a bare press on a managed window
    /// (the sync click-to-focus grab) raises, focuses, and replays.
    fn handle_button_press(&mut self, ev: &x::ButtonPressEvent) {
        let child = ev.child();
        if !child.is_none() {
            let Some(geometry) = self.x11.window_geometry(child) else {
                debug!("Drag target {child:?} vanished before geometry query");
                return;
            };
            let mode = if ev.state().contains(KeyButMask::SHIFT) {
                DragMode::Resize
            } else {
                DragMode::Move
            };
            let effects = self.state.begin_drag(
                child,
                (ev.root_x() as i32, ev.root_y() as i32),
                (geometry.x, geometry.y, geometry.w, geometry.h),
                mode,
            );
            self.x11.apply_effects_checked(&effects);
        } else if ev.event() != self.x11.root() {
            let effects = self.state.on_click_to_focus(ev.event());
            self.x11.apply_effects_checked(&effects);
        }
    }

    /// Lifts exactly the fields named by the request's value mask, so the
    /// forwarded configure touches nothing the client did not ask about.
    fn requested_changes(ev: &x::ConfigureRequestEvent) -> ConfigureChanges {
        let mask = ev.value_mask();
        ConfigureChanges {
            x: mask
                .contains(x::ConfigWindowMask::X)
                .then(|| ev.x() as i32),
            y: mask
                .contains(x::ConfigWindowMask::Y)
                .then(|| ev.y() as i32),
            width: mask
                .contains(x::ConfigWindowMask::WIDTH)
                .then(|| ev.width() as u32),
            height: mask
                .contains(x::ConfigWindowMask::HEIGHT)
                .then(|| ev.height() as u32),
            border_width: mask
                .contains(x::ConfigWindowMask::BORDER_WIDTH)
                .then(|| ev.border_width() as u32),
            sibling: mask
                .contains(x::ConfigWindowMask::SIBLING)
                .then(|| ev.sibling()),
            stack_mode: mask
                .contains(x::ConfigWindowMask::STACK_MODE)
                .then(|| ev.stack_mode()),
        }
    }

    /// Only WM_CHANGE_STATE asking for iconic is recognized; every other
    /// client message type is ignored.
    fn handle_client_message(&mut self, ev: &x::ClientMessageEvent) {
        if ev.r#type() != self.x11.atoms().wm_change_state {
            return;
        }
        let requests_iconic = match ev.data() {
            x::ClientMessageData::Data32(data) => data[0] == WmState::Iconic.value(),
            _ => false,
        };
        if requests_iconic {
            debug!("Iconify requested for window {:?}", ev.window());
            let effects = self.state.on_iconify_request(ev.window());
            self.x11.apply_effects_checked(&effects);
        }
    }
}
