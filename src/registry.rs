use xcb::x::Window;

/// Tracked lifecycle state of one client. `Gone` is never stored in the
/// registry; it is the transition result meaning the entry was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Mapped,
    Iconified,
    Gone,
}

#[derive(Debug)]
pub struct TrackedClient {
    window: Window,
    state: ClientState,
}

impl TrackedClient {
    pub const fn window(&self) -> Window {
        self.window
    }

    pub const fn state(&self) -> ClientState {
        self.state
    }
}

/// Ordered collection of managed top-level windows. Order is insertion
/// order; `current` points at the most recently focused/inserted entry and
/// is `None` exactly when the registry is empty.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Vec<TrackedClient>,
    current: Option<usize>,
}

impl ClientRegistry {
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn find(&self, window: Window) -> Option<usize> {
        self.clients.iter().position(|c| c.window == window)
    }

    pub fn contains(&self, window: Window) -> bool {
        self.find(window).is_some()
    }

    pub fn get(&self, idx: usize) -> Option<&TrackedClient> {
        self.clients.get(idx)
    }

    pub fn state_of(&self, window: Window) -> Option<ClientState> {
        self.find(window).map(|i| self.clients[i].state)
    }

    /// Appends a new client and makes it current. Adding a window that is
    /// already tracked is a no-op; returns whether an entry was created.
    pub fn add(&mut self, window: Window) -> bool {
        if self.contains(window) {
            return false;
        }
        self.clients.push(TrackedClient {
            window,
            state: ClientState::Mapped,
        });
        self.current = Some(self.clients.len() - 1);
        true
    }

    /// Removes a client, preserving the relative order of the rest. No-op
    /// for untracked windows. Returns the removed entry's state.
    pub fn remove(&mut self, window: Window) -> Option<ClientState> {
        let idx = self.find(window)?;
        let removed = self.clients.remove(idx);
        self.clamp_current();
        Some(removed.state)
    }

    fn clamp_current(&mut self) {
        if self.clients.is_empty() {
            self.current = None;
            return;
        }
        match self.current {
            Some(c) if c < self.clients.len() => {}
            _ => self.current = Some(self.clients.len() - 1),
        }
    }

    /// Advances `current` circularly and returns the new current entry.
    pub fn advance(&mut self) -> Option<&TrackedClient> {
        if self.clients.is_empty() {
            return None;
        }
        let next = match self.current {
            Some(c) => (c + 1) % self.clients.len(),
            None => 0,
        };
        self.current = Some(next);
        self.clients.get(next)
    }

    pub fn set_state(&mut self, window: Window, state: ClientState) {
        debug_assert_ne!(state, ClientState::Gone);
        if let Some(idx) = self.find(window) {
            self.clients[idx].state = state;
        }
    }

    /// Transition table for a server-issued UnmapNotify. A mapped client
    /// that unmaps has been withdrawn or destroyed and is dropped; an
    /// iconified client unmapped by us stays tracked.
    pub fn unmap_transition(&mut self, window: Window) -> Option<ClientState> {
        match self.state_of(window)? {
            ClientState::Mapped => {
                self.remove(window);
                Some(ClientState::Gone)
            }
            ClientState::Iconified => Some(ClientState::Iconified),
            ClientState::Gone => unreachable!("Gone entries are never stored"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedClient> {
        self.clients.iter()
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;
    use xcb::XidNew;

    fn win(id: u32) -> Window {
        unsafe { Window::new(id) }
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut reg = ClientRegistry::default();
        assert!(reg.add(win(1)));
        assert!(!reg.add(win(1)));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.current(), Some(0));
    }

    #[test]
    fn test_remove_preserves_order_and_clamps_current() {
        let mut reg = ClientRegistry::default();
        for id in 1..=3 {
            reg.add(win(id));
        }
        assert_eq!(reg.current(), Some(2));

        reg.remove(win(3));
        assert_eq!(reg.current(), Some(1));
        assert_eq!(reg.get(0).unwrap().window(), win(1));
        assert_eq!(reg.get(1).unwrap().window(), win(2));

        reg.remove(win(1));
        assert_eq!(reg.current(), Some(0));
        assert_eq!(reg.get(0).unwrap().window(), win(2));

        reg.remove(win(2));
        assert_eq!(reg.current(), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_untracked_is_noop() {
        let mut reg = ClientRegistry::default();
        reg.add(win(1));
        assert_eq!(reg.remove(win(99)), None);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.current(), Some(0));
    }

    #[test]
    fn test_no_duplicates_and_current_in_bounds_under_churn() {
        let mut reg = ClientRegistry::default();
        for id in 0..20 {
            reg.add(win(id % 7));
            if id % 3 == 0 {
                reg.remove(win(id % 5));
            }
            let mut seen: Vec<u32> = reg.iter().map(|c| xcb::Xid::resource_id(&c.window())).collect();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), reg.len());
            match reg.current() {
                Some(c) => assert!(c < reg.len()),
                None => assert!(reg.is_empty()),
            }
        }
    }

    #[test]
    fn test_advance_wraps_around() {
        let mut reg = ClientRegistry::default();
        for id in 1..=3 {
            reg.add(win(id));
        }
        // current starts at the last inserted entry (index 2)
        let order: Vec<Window> = (0..3).map(|_| reg.advance().unwrap().window()).collect();
        assert_eq!(order, vec![win(1), win(2), win(3)]);
        assert_eq!(reg.current(), Some(2));
    }

    #[test]
    fn test_advance_on_empty_is_noop() {
        let mut reg = ClientRegistry::default();
        assert!(reg.advance().is_none());
        assert_eq!(reg.current(), None);
    }

    #[test]
    fn test_unmap_transition_table() {
        let mut reg = ClientRegistry::default();
        reg.add(win(1));
        reg.add(win(2));
        reg.set_state(win(2), ClientState::Iconified);

        assert_eq!(reg.unmap_transition(win(1)), Some(ClientState::Gone));
        assert!(!reg.contains(win(1)));

        assert_eq!(reg.unmap_transition(win(2)), Some(ClientState::Iconified));
        assert!(reg.contains(win(2)));

        assert_eq!(reg.unmap_transition(win(99)), None);
        assert_eq!(reg.len(), 1);
    }
}
