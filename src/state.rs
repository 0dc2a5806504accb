use log::debug;
use xcb::x::Window;

use crate::atoms::WmState;
use crate::config::{BORDER_WIDTH, MIN_WINDOW_SIZE};
use crate::effect::{ConfigureChanges, Effect};
use crate::monitor::{select_monitor, Rect};
use crate::registry::{ClientRegistry, ClientState};

#[derive(Clone, Copy, Debug)]
pub struct ScreenConfig {
    pub width: u32,
    pub height: u32,
    pub border_pixel: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Move,
    Resize,
}

/// An in-progress pointer drag. At most one exists; it lives from a
/// qualifying ButtonPress to the next ButtonRelease.
#[derive(Debug, Clone, Copy)]
struct DragSession {
    window: Window,
    pointer_x: i32,
    pointer_y: i32,
    win_x: i32,
    win_y: i32,
    win_w: u32,
    win_h: u32,
    mode: DragMode,
}

/// The window manager's state machine. Every handler takes one event's
/// worth of input, mutates the registry and/or drag session, and returns
/// the server commands to issue. No X calls happen here, so the whole
/// machine runs under test with synthetic window ids.
pub struct State {
    registry: ClientRegistry,
    drag: Option<DragSession>,
    screen: ScreenConfig,
}

impl State {
    pub fn new(screen: ScreenConfig) -> Self {
        Self {
            registry: ClientRegistry::default(),
            drag: None,
            screen,
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn drag_active(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts tracking a top-level window: minimal border, EnterNotify
    /// subscription, the click-to-focus grab, and WM_STATE Normal.
    /// Re-managing a tracked window is a no-op.
    pub fn manage(&mut self, window: Window) -> Vec<Effect> {
        if !self.registry.add(window) {
            debug!("Window {window:?} already managed, skipping");
            return vec![];
        }
        vec![
            Effect::SetBorder {
                window,
                pixel: self.screen.border_pixel,
                width: BORDER_WIDTH,
            },
            Effect::SelectEnter(window),
            Effect::GrabClicks(window),
            Effect::SetWmState {
                window,
                state: WmState::Normal,
            },
        ]
    }

    pub fn on_map_request(&mut self, window: Window) -> Vec<Effect> {
        let mut effects = vec![Effect::Map(window)];
        if self.registry.contains(window) {
            // a tracked window re-mapping itself is a restore, not a new client
            if self.registry.state_of(window) == Some(ClientState::Iconified) {
                self.registry.set_state(window, ClientState::Mapped);
                effects.push(Effect::SetWmState {
                    window,
                    state: WmState::Normal,
                });
            }
        } else {
            effects.extend(self.manage(window));
        }
        effects.push(Effect::Focus(window));
        effects
    }

    pub fn on_destroy(&mut self, window: Window) -> Vec<Effect> {
        self.registry.remove(window);
        // the drag target may die mid-drag; late motion must not touch it
        if self.drag.map(|d| d.window) == Some(window) {
            self.drag = None;
        }
        vec![]
    }

    /// An unmap we did not cause means the client withdrew; one we caused
    /// (iconify) keeps the client tracked. The registry's transition table
    /// disambiguates.
    pub fn on_unmap(&mut self, window: Window) -> Vec<Effect> {
        match self.registry.unmap_transition(window) {
            Some(ClientState::Gone) => debug!("Window {window:?} withdrawn, untracked"),
            Some(_) => debug!("Window {window:?} unmapped by us, still tracked"),
            None => {}
        }
        vec![]
    }

    /// WM_CHANGE_STATE asking for iconic: remember the flag, persist it as
    /// WM_STATE, and unmap. The unmap goes out even for untracked windows,
    /// matching what clients expect from the message.
    pub fn on_iconify_request(&mut self, window: Window) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.registry.contains(window) {
            self.registry.set_state(window, ClientState::Iconified);
            effects.push(Effect::SetWmState {
                window,
                state: WmState::Iconic,
            });
        }
        effects.push(Effect::Unmap(window));
        effects
    }

    /// Circular focus traversal. An iconified window becoming current is
    /// restored first, then raised and focused.
    pub fn focus_next(&mut self) -> Vec<Effect> {
        let Some(client) = self.registry.advance() else {
            return vec![];
        };
        let window = client.window();
        let iconified = client.state() == ClientState::Iconified;

        let mut effects = Vec::new();
        if iconified {
            self.registry.set_state(window, ClientState::Mapped);
            effects.push(Effect::Map(window));
            effects.push(Effect::SetWmState {
                window,
                state: WmState::Normal,
            });
        }
        effects.push(Effect::Raise(window));
        effects.push(Effect::Focus(window));
        effects
    }

    pub fn on_enter(&mut self, window: Window) -> Vec<Effect> {
        vec![Effect::Focus(window)]
    }

    /// Click on a client without the drag modifier: raise, focus, and hand
    /// the frozen press back so the client still sees its click.
    pub fn on_click_to_focus(&mut self, window: Window) -> Vec<Effect> {
        vec![
            Effect::Raise(window),
            Effect::Focus(window),
            Effect::ReplayPointer,
        ]
    }

    pub fn begin_drag(
        &mut self,
        window: Window,
        pointer: (i32, i32),
        geometry: (i32, i32, u32, u32),
        mode: DragMode,
    ) -> Vec<Effect> {
        let (win_x, win_y, win_w, win_h) = geometry;
        self.drag = Some(DragSession {
            window,
            pointer_x: pointer.0,
            pointer_y: pointer.1,
            win_x,
            win_y,
            win_w,
            win_h,
            mode,
        });
        vec![Effect::Raise(window)]
    }

    pub fn on_motion(&mut self, root_x: i32, root_y: i32) -> Vec<Effect> {
        let Some(drag) = self.drag else {
            return vec![];
        };
        let dx = root_x - drag.pointer_x;
        let dy = root_y - drag.pointer_y;

        match drag.mode {
            DragMode::Move => vec![Effect::Move {
                window: drag.window,
                x: drag.win_x + dx,
                y: drag.win_y + dy,
            }],
            DragMode::Resize => vec![Effect::Resize {
                window: drag.window,
                w: Self::floored_dimension(drag.win_w, dx),
                h: Self::floored_dimension(drag.win_h, dy),
            }],
        }
    }

    /// A dimension that would drop below the floor keeps its starting
    /// value; the other axis is unaffected.
    fn floored_dimension(start: u32, delta: i32) -> u32 {
        let proposed = start as i32 + delta;
        if proposed >= MIN_WINDOW_SIZE {
            proposed as u32
        } else {
            start
        }
    }

    pub fn end_drag(&mut self) -> Vec<Effect> {
        self.drag = None;
        vec![]
    }

    /// Client-initiated configuration is honored verbatim.
    pub fn on_configure_request(
        &mut self,
        window: Window,
        changes: ConfigureChanges,
    ) -> Vec<Effect> {
        vec![Effect::ConfigureForward { window, changes }]
    }

    /// One-shot maximize to the monitor containing the window's origin,
    /// or to the full virtual screen when no monitor matches.
    pub fn maximize(&self, window: Window, origin: (i32, i32), monitors: &[Rect]) -> Vec<Effect> {
        let target = select_monitor(monitors, origin.0, origin.1).unwrap_or(Rect {
            x: 0,
            y: 0,
            w: self.screen.width,
            h: self.screen.height,
        });
        vec![Effect::MoveResize {
            window,
            x: target.x,
            y: target.y,
            w: target.w,
            h: target.h,
        }]
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;
    use xcb::XidNew;

    fn win(id: u32) -> Window {
        unsafe { Window::new(id) }
    }

    fn make_state() -> State {
        State::new(ScreenConfig {
            width: 1600,
            height: 900,
            border_pixel: 0,
        })
    }

    fn focus_targets(effects: &[Effect]) -> Vec<Window> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Focus(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_map_request_manages_and_focuses() {
        let mut state = make_state();
        let w = win(1);
        let effects = state.on_map_request(w);

        assert_eq!(effects[0], Effect::Map(w));
        assert!(effects.contains(&Effect::SetBorder {
            window: w,
            pixel: 0,
            width: BORDER_WIDTH
        }));
        assert!(effects.contains(&Effect::GrabClicks(w)));
        assert!(effects.contains(&Effect::SetWmState {
            window: w,
            state: WmState::Normal
        }));
        assert_eq!(effects.last(), Some(&Effect::Focus(w)));
        assert_eq!(state.registry().len(), 1);
    }

    #[test]
    fn test_duplicate_map_request_does_not_remanage() {
        let mut state = make_state();
        let w = win(1);
        state.on_map_request(w);
        let effects = state.on_map_request(w);

        assert_eq!(state.registry().len(), 1);
        assert_eq!(effects, vec![Effect::Map(w), Effect::Focus(w)]);
    }

    #[test]
    fn test_map_request_restores_iconified_window() {
        let mut state = make_state();
        let w = win(1);
        state.on_map_request(w);
        state.on_iconify_request(w);

        let effects = state.on_map_request(w);
        assert!(effects.contains(&Effect::Map(w)));
        assert!(effects.contains(&Effect::SetWmState {
            window: w,
            state: WmState::Normal
        }));
        assert_eq!(state.registry().state_of(w), Some(ClientState::Mapped));
        assert_eq!(state.registry().len(), 1);
    }

    #[test]
    fn test_destroy_of_untracked_window_is_noop() {
        let mut state = make_state();
        state.on_map_request(win(1));
        let effects = state.on_destroy(win(42));

        assert!(effects.is_empty());
        assert_eq!(state.registry().len(), 1);
    }

    #[test]
    fn test_focus_next_on_empty_registry_is_noop() {
        let mut state = make_state();
        assert!(state.focus_next().is_empty());
    }

    #[test]
    fn test_focus_next_cycles_in_insertion_order() {
        let mut state = make_state();
        let (a, b, c) = (win(1), win(2), win(3));
        for w in [a, b, c] {
            state.on_map_request(w);
        }
        // rewind current from C (last inserted) to A
        state.focus_next();
        assert_eq!(state.registry().current(), Some(0));

        let mut observed = Vec::new();
        for _ in 0..3 {
            let effects = state.focus_next();
            observed.extend(focus_targets(&effects));
            assert!(effects.contains(&Effect::Raise(*observed.last().unwrap())));
        }

        assert_eq!(observed, vec![b, c, a]);
        assert_eq!(state.registry().current(), Some(0));
    }

    #[test]
    fn test_focus_next_restores_exactly_the_iconified_window() {
        let mut state = make_state();
        let (a, b, c) = (win(1), win(2), win(3));
        for w in [a, b, c] {
            state.on_map_request(w);
        }
        let effects = state.on_iconify_request(b);
        assert!(effects.contains(&Effect::Unmap(b)));
        assert!(effects.contains(&Effect::SetWmState {
            window: b,
            state: WmState::Iconic
        }));

        // advance until B becomes current
        let mut restore_effects = Vec::new();
        for _ in 0..3 {
            let effects = state.focus_next();
            if focus_targets(&effects) == vec![b] {
                restore_effects = effects;
                break;
            }
        }

        assert!(restore_effects.contains(&Effect::Map(b)));
        assert!(restore_effects.contains(&Effect::SetWmState {
            window: b,
            state: WmState::Normal
        }));
        assert_eq!(state.registry().state_of(b), Some(ClientState::Mapped));
        assert_eq!(state.registry().state_of(a), Some(ClientState::Mapped));
        assert_eq!(state.registry().state_of(c), Some(ClientState::Mapped));
    }

    #[test]
    fn test_unmap_of_iconified_window_keeps_it_tracked() {
        let mut state = make_state();
        let w = win(1);
        state.on_map_request(w);
        state.on_iconify_request(w);

        state.on_unmap(w);
        assert!(state.registry().contains(w));
        assert_eq!(state.registry().state_of(w), Some(ClientState::Iconified));
    }

    #[test]
    fn test_unmap_of_mapped_window_untracks_it() {
        let mut state = make_state();
        let w = win(1);
        state.on_map_request(w);

        state.on_unmap(w);
        assert!(!state.registry().contains(w));
    }

    #[test]
    fn test_move_drag_applies_pointer_delta() {
        let mut state = make_state();
        let w = win(1);
        state.on_map_request(w);

        let effects = state.begin_drag(w, (700, 500), (100, 100, 200, 150), DragMode::Move);
        assert_eq!(effects, vec![Effect::Raise(w)]);

        let effects = state.on_motion(730, 490);
        assert_eq!(
            effects,
            vec![Effect::Move {
                window: w,
                x: 130,
                y: 90
            }]
        );

        state.end_drag();
        assert!(!state.drag_active());
        assert!(state.on_motion(800, 800).is_empty());
    }

    #[test]
    fn test_resize_drag_grows_window() {
        let mut state = make_state();
        let w = win(1);
        state.begin_drag(w, (0, 0), (100, 100, 200, 150), DragMode::Resize);

        let effects = state.on_motion(30, -10);
        assert_eq!(
            effects,
            vec![Effect::Resize {
                window: w,
                w: 230,
                h: 140
            }]
        );
    }

    #[test]
    fn test_resize_floor_rejects_one_axis_independently() {
        let mut state = make_state();
        let w = win(1);
        state.begin_drag(w, (0, 0), (100, 100, 200, 150), DragMode::Resize);

        // width would drop to 5; height still shrinks to 120
        let effects = state.on_motion(-195, -30);
        assert_eq!(
            effects,
            vec![Effect::Resize {
                window: w,
                w: 200,
                h: 120
            }]
        );

        // both below the floor: geometry held at the drag origin size
        let effects = state.on_motion(-195, -145);
        assert_eq!(
            effects,
            vec![Effect::Resize {
                window: w,
                w: 200,
                h: 150
            }]
        );
    }

    #[test]
    fn test_destroy_of_drag_target_cancels_drag() {
        let mut state = make_state();
        let w = win(1);
        state.on_map_request(w);
        state.begin_drag(w, (0, 0), (0, 0, 100, 100), DragMode::Move);

        state.on_destroy(w);
        assert!(!state.drag_active());
        assert!(state.on_motion(50, 50).is_empty());
    }

    #[test]
    fn test_maximize_fills_containing_monitor() {
        let state = make_state();
        let monitors = [
            Rect {
                x: 0,
                y: 0,
                w: 800,
                h: 600,
            },
            Rect {
                x: 800,
                y: 0,
                w: 1024,
                h: 768,
            },
        ];
        let w = win(1);
        let effects = state.maximize(w, (850, 10), &monitors);
        assert_eq!(
            effects,
            vec![Effect::MoveResize {
                window: w,
                x: 800,
                y: 0,
                w: 1024,
                h: 768
            }]
        );
    }

    #[test]
    fn test_maximize_falls_back_to_full_screen() {
        let state = make_state();
        let w = win(1);
        let effects = state.maximize(w, (5000, 5000), &[]);
        assert_eq!(
            effects,
            vec![Effect::MoveResize {
                window: w,
                x: 0,
                y: 0,
                w: 1600,
                h: 900
            }]
        );
    }

    #[test]
    fn test_configure_request_is_forwarded_verbatim() {
        let mut state = make_state();
        let w = win(1);
        let changes = ConfigureChanges {
            x: Some(10),
            width: Some(300),
            ..Default::default()
        };
        let effects = state.on_configure_request(w, changes);
        assert_eq!(effects, vec![Effect::ConfigureForward { window: w, changes }]);
    }
}
