/// One physical output's rectangle in root coordinates. Queried from
/// Xinerama on demand and never cached, since outputs can change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && px < self.x + self.w as i32
            && py >= self.y
            && py < self.y + self.h as i32
    }
}

/// First monitor whose bounds contain the point, if any.
pub fn select_monitor(monitors: &[Rect], px: i32, py: i32) -> Option<Rect> {
    monitors.iter().copied().find(|m| m.contains(px, py))
}
