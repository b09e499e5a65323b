//! Outside-click dismissal for contextual menus.
//!
//! The renderer registers the on-screen bounds of each menu it draws. A
//! pointer-down that lands outside the bounds of the open menu closes it.

use std::collections::HashMap;

use crate::models::EntryId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; the right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Rendered menu regions, keyed by the entry owning the menu.
#[derive(Debug, Clone, Default)]
pub struct OutsideClickTracker {
    regions: HashMap<EntryId, Bounds>,
}

impl OutsideClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: EntryId, bounds: Bounds) {
        self.regions.insert(id, bounds);
    }

    /// Forget every region. Called whenever the open menu closes or changes,
    /// so a reopened menu is never hit-tested against where it used to be.
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// True when a menu is open, its region is known, and `point` is outside it.
    /// A menu that has not been rendered yet is never dismissed.
    pub fn should_dismiss(&self, open: Option<EntryId>, point: Point) -> bool {
        open.and_then(|id| self.regions.get(&id))
            .is_some_and(|bounds| !bounds.contains(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_contains() {
        let bounds = Bounds::new(10.0, 10.0, 20.0, 5.0);
        assert!(bounds.contains(Point::new(10.0, 10.0)));
        assert!(bounds.contains(Point::new(29.9, 14.9)));
        assert!(!bounds.contains(Point::new(30.0, 12.0)));
        assert!(!bounds.contains(Point::new(15.0, 9.0)));
    }

    #[test]
    fn test_should_dismiss() {
        let mut tracker = OutsideClickTracker::new();
        let id = EntryId::new();
        let inside = Point::new(1.0, 1.0);
        let outside = Point::new(50.0, 50.0);

        // Nothing open
        assert!(!tracker.should_dismiss(None, outside));
        // Open but not rendered yet
        assert!(!tracker.should_dismiss(Some(id), outside));

        tracker.register(id, Bounds::new(0.0, 0.0, 10.0, 10.0));
        assert!(!tracker.should_dismiss(Some(id), inside));
        assert!(tracker.should_dismiss(Some(id), outside));

        tracker.clear();
        assert!(!tracker.should_dismiss(Some(id), outside));
    }
}
