//! Navigation drawer and dropdown toggles
//!
//! Each flips one visual state on a click. Nothing persists across reloads.

use serde::{Deserialize, Serialize};

/// Slide-in navigation panel, closed on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NavDrawer {
    open: bool,
}

impl NavDrawer {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Hamburger click
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close button click
    pub fn close(&mut self) {
        self.open = false;
    }

    /// CSS `left` of the panel
    pub fn left_offset(&self) -> &'static str {
        if self.open {
            "0"
        } else {
            "-100%"
        }
    }
}

/// Show/hide dropdown panel, hidden on load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dropdown {
    shown: bool,
}

impl Dropdown {
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn toggle(&mut self) {
        self.shown = !self.shown;
    }

    pub fn hide(&mut self) {
        self.shown = false;
    }

    /// CSS `display` of the panel
    pub fn display(&self) -> &'static str {
        if self.shown {
            "block"
        } else {
            "none"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawer_toggle_twice_restores_closed() {
        let mut drawer = NavDrawer::default();
        assert_eq!(drawer.left_offset(), "-100%");

        drawer.toggle();
        assert!(drawer.is_open());
        assert_eq!(drawer.left_offset(), "0");

        drawer.toggle();
        assert_eq!(drawer, NavDrawer::default());
        assert_eq!(drawer.left_offset(), "-100%");
    }

    #[test]
    fn test_drawer_close_button() {
        let mut drawer = NavDrawer::default();
        drawer.open();
        drawer.close();
        assert!(!drawer.is_open());
        drawer.close();
        assert!(!drawer.is_open());
    }

    #[test]
    fn test_dropdown_toggle() {
        let mut dropdown = Dropdown::default();
        assert_eq!(dropdown.display(), "none");
        dropdown.toggle();
        assert_eq!(dropdown.display(), "block");
        dropdown.toggle();
        assert!(!dropdown.is_shown());
    }
}
