//! Mobile navigation menu
//!
//! The menu panel, the hamburger icon and the body scroll lock all follow a
//! single `is_open` flag. Every transition goes through [`MenuController::set_open`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::MenuSettings;

/// Inputs the menu reacts to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuEvent {
    /// Hamburger button clicked
    Toggle,
    /// In-page navigation link clicked
    LinkClicked,
    /// Click that landed outside both the panel and the hamburger
    OutsideClick,
    /// Viewport resized to `width` px
    Resize { width: u32 },
    /// Key pressed anywhere on the page
    Key(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MenuState {
    pub is_open: bool,
}

/// Classes and body style derived from the menu state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MenuView {
    pub hamburger_active: bool,
    pub panel_active: bool,
    pub scroll_locked: bool,
}

#[derive(Debug)]
pub struct MenuController {
    state: MenuState,
    scroll_locked: bool,
    breakpoint: u32,
}

impl MenuController {
    pub fn new(settings: &MenuSettings) -> Self {
        Self {
            state: MenuState::default(),
            scroll_locked: false,
            breakpoint: settings.breakpoint,
        }
    }

    pub fn toggle(&mut self) {
        self.set_open(!self.state.is_open);
    }

    pub fn close(&mut self) {
        self.set_open(false);
    }

    /// Apply an input; returns true when the open state changed
    pub fn handle(&mut self, event: &MenuEvent) -> bool {
        let was_open = self.state.is_open;
        match event {
            MenuEvent::Toggle => self.toggle(),
            MenuEvent::LinkClicked | MenuEvent::OutsideClick => {
                if was_open {
                    self.close();
                }
            }
            MenuEvent::Resize { width } => {
                if *width > self.breakpoint && was_open {
                    self.close();
                }
            }
            MenuEvent::Key(key) => {
                if key == crate::constants::menu::CLOSE_KEY && was_open {
                    self.close();
                }
            }
        }
        was_open != self.state.is_open
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn view(&self) -> MenuView {
        MenuView {
            hamburger_active: self.state.is_open,
            panel_active: self.state.is_open,
            scroll_locked: self.scroll_locked,
        }
    }

    fn set_open(&mut self, open: bool) {
        self.state.is_open = open;
        // Lock is always rewritten, whichever path opened the menu
        self.scroll_locked = open;
        debug!(open = open, "Menu state changed");
    }
}
