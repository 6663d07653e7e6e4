//! Scripted page sessions
//!
//! A replay script is a JSON document with an optional layout and a list of
//! events stamped with page-clock milliseconds. Replaying it yields one
//! snapshot per event, plus a final one after the optional settle time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::config::SiteConfig;
use crate::page::{Page, PageEvent, PageLayout, PageSnapshot};
use crate::timer::at_ms;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    #[serde(flatten)]
    pub event: PageEvent,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub layout: PageLayout,
    pub events: Vec<TimedEvent>,
    /// Extra time after the last event before the final snapshot
    #[serde(default)]
    pub settle_ms: u64,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script {:?}", path))?;
        Self::parse(&contents).with_context(|| format!("Invalid replay script {:?}", path))
    }

    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse replay script JSON")
    }

    /// Run every event in clock order and collect the snapshots
    pub fn run(&self, config: &SiteConfig) -> Vec<PageSnapshot> {
        let mut events: Vec<&TimedEvent> = self.events.iter().collect();
        events.sort_by_key(|e| e.at_ms);

        let mut page = Page::new(&self.layout, config);
        let mut snapshots = Vec::with_capacity(events.len() + 1);
        let mut last = 0;

        for timed in events {
            page.dispatch(&timed.event, at_ms(timed.at_ms));
            snapshots.push(page.snapshot());
            last = timed.at_ms;
        }

        if self.settle_ms > 0 {
            page.tick(at_ms(last + self.settle_ms));
            snapshots.push(page.snapshot());
        }

        info!(events = self.events.len(), snapshots = snapshots.len(), "Replay finished");
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r##"{
        "events": [
            { "at_ms": 500, "type": "click", "target": { "kind": "nav_link", "href": "#contact" } },
            { "at_ms": 0, "type": "click", "target": { "kind": "hamburger" } },
            { "at_ms": 900, "type": "key_down", "key": "Escape" }
        ],
        "settle_ms": 2500
    }"##;

    #[test]
    fn test_replay_orders_events_by_clock() {
        let script = ReplayScript::parse(SCRIPT).unwrap();
        let snapshots = script.run(&SiteConfig::default());

        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[0].at_ms, 0);
        assert!(snapshots[0].menu.panel_active);
        assert!(!snapshots[1].menu.panel_active);

        let last = snapshots.last().unwrap();
        assert_eq!(last.at_ms, 3400);
        assert_eq!(last.scroll.active_link.as_deref(), Some("#contact"));
    }

    #[test]
    fn test_bad_event_does_not_stop_replay() {
        let script = ReplayScript::parse(
            r##"{ "events": [
                { "at_ms": 0, "type": "click", "target": { "kind": "nav_link", "href": "#nowhere" } },
                { "at_ms": 20, "type": "scroll", "offset_y": 400 }
            ] }"##,
        )
        .unwrap();

        let snapshots = script.run(&SiteConfig::default());
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[1].scroll.progress_percent > 0.0);
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = ReplayScript::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.json"));
    }
}
