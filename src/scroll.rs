//! Scroll-driven navigation state
//!
//! Tracks the vertical scroll offset and derives the navbar style, the
//! highlighted navigation link, the back-to-top button and the progress bar.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::ScrollSettings;
use crate::timer::Debouncer;

/// A page section with an id that a navigation link can point at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl Section {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    /// Half-open hit test: `[top, top + height)`
    pub fn contains(&self, position: f64) -> bool {
        position >= self.top && position < self.top + self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrollState {
    pub offset_y: f64,
    pub active_section: Option<String>,
}

/// What the page shows as a result of the scroll position
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScrollView {
    pub navbar_scrolled: bool,
    /// `href` of the highlighted nav link, e.g. `#about`
    pub active_link: Option<String>,
    pub back_to_top_visible: bool,
    pub progress_percent: f64,
}

/// Progress bar width for a scroll position; 0 when nothing can scroll
pub fn progress_percent(scroll_top: f64, document_height: f64, viewport_height: f64) -> f64 {
    let scrollable = document_height - viewport_height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
}

#[derive(Debug)]
pub struct ScrollCoordinator {
    sections: Vec<Section>,
    document_height: f64,
    viewport_height: f64,
    settings: ScrollSettings,
    debounce: Debouncer,
    latest_offset: f64,
    state: ScrollState,
    view: ScrollView,
}

impl ScrollCoordinator {
    pub fn new(
        sections: Vec<Section>,
        document_height: f64,
        viewport_height: f64,
        settings: ScrollSettings,
    ) -> Self {
        let debounce = Debouncer::from_millis(settings.debounce_ms);
        let mut coordinator = Self {
            sections,
            document_height,
            viewport_height,
            settings,
            debounce,
            latest_offset: 0.0,
            state: ScrollState::default(),
            view: ScrollView::default(),
        };
        // Initial paint happens without waiting for a scroll event
        coordinator.recompute();
        coordinator
    }

    /// Record a raw scroll event; derived state is recomputed once the debounce fires
    pub fn on_scroll(&mut self, offset_y: f64, now: Duration) {
        self.latest_offset = offset_y.max(0.0);
        self.view.progress_percent =
            progress_percent(self.latest_offset, self.document_height, self.viewport_height);
        self.debounce.call(now);
    }

    /// Run the debounced handler if it is due; returns true when the view was recomputed
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.debounce.fire_if_due(now) {
            self.recompute();
            true
        } else {
            false
        }
    }

    pub fn resize(&mut self, viewport_height: f64, document_height: f64) {
        self.viewport_height = viewport_height;
        self.document_height = document_height;
        self.view.progress_percent =
            progress_percent(self.latest_offset, self.document_height, self.viewport_height);
    }

    /// The section whose bounds contain `offset_y + header_height`
    ///
    /// Sections are checked in document order; with overlapping geometry the
    /// last match wins.
    pub fn active_section_at(&self, offset_y: f64) -> Option<&Section> {
        let position = offset_y + self.settings.header_height;
        self.sections.iter().rev().find(|section| section.contains(position))
    }

    /// Scroll offset that puts the section just below the fixed header
    pub fn scroll_target(&self, section_id: &str) -> Option<f64> {
        self.sections
            .iter()
            .find(|section| section.id == section_id)
            .map(|section| (section.top - self.settings.header_height).max(0.0))
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn view(&self) -> &ScrollView {
        &self.view
    }

    pub fn has_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    fn recompute(&mut self) {
        let offset = self.latest_offset;
        let active = self.active_section_at(offset).map(|s| s.id.clone());

        if active != self.state.active_section {
            debug!(offset = offset, section = ?active, "Active section changed");
        }

        self.state = ScrollState {
            offset_y: offset,
            active_section: active.clone(),
        };
        self.view = ScrollView {
            navbar_scrolled: offset > self.settings.scrolled_offset,
            active_link: active.map(|id| format!("#{id}")),
            back_to_top_visible: offset > self.settings.back_to_top_offset,
            progress_percent: progress_percent(offset, self.document_height, self.viewport_height),
        };
    }
}
