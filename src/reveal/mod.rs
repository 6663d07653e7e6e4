//! One-time reveal animations
//!
//! Elements register with their document bounds and what should happen when
//! they first come into view: a fade-in class, a counter animation or a
//! deferred image source swapped in. The
//! `revealed` set is the source of truth; a revealed element is unsubscribed
//! and never animates again.
//!
//! Two observation strategies are supported:
//! - **Observer**: every scroll sample computes the visible fraction of each
//!   subscribed element and reveals it once the kind's threshold is reached.
//! - **ScrollFallback**: for pages without an observation facility, scroll
//!   samples are debounced and fully on-screen elements are revealed.

pub mod counter;
pub mod typing;

pub use counter::{CounterAnimation, CounterFrame, CounterSpec};
pub use typing::TypingEffect;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::RevealSettings;
use crate::geometry::{is_in_viewport, visible_fraction, Rect, Viewport};
use crate::timer::Debouncer;

/// Stable identity of an observed element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealKind {
    FadeIn,
    Counter(CounterSpec),
    /// Image whose real source is only set once any part of it is on screen
    LazyImage { src: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationMode {
    #[default]
    Observer,
    ScrollFallback,
}

/// Terminal transition applied to an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RevealEffect {
    FadedIn(ElementId),
    CounterStarted(ElementId),
    ImageLoaded { id: ElementId, src: String },
}

#[derive(Debug, Clone)]
struct Observed {
    bounds: Rect,
    kind: RevealKind,
    threshold: f64,
}

#[derive(Debug)]
pub struct VisibilityAnimator {
    mode: ObservationMode,
    viewport: Viewport,
    settings: RevealSettings,
    observed: BTreeMap<ElementId, Observed>,
    revealed: BTreeSet<ElementId>,
    counters: BTreeMap<ElementId, CounterAnimation>,
    counter_text: BTreeMap<ElementId, String>,
    images: BTreeMap<ElementId, String>,
    fallback: Debouncer,
    latest_scroll: f64,
}

impl VisibilityAnimator {
    pub fn new(mode: ObservationMode, viewport: Viewport, settings: RevealSettings) -> Self {
        let fallback = Debouncer::from_millis(settings.fallback_debounce_ms);
        Self {
            mode,
            viewport,
            settings,
            observed: BTreeMap::new(),
            revealed: BTreeSet::new(),
            counters: BTreeMap::new(),
            counter_text: BTreeMap::new(),
            images: BTreeMap::new(),
            fallback,
            latest_scroll: 0.0,
        }
    }

    /// Subscribe an element; returns false if it is already known
    pub fn register(&mut self, id: ElementId, bounds: Rect, kind: RevealKind) -> bool {
        if self.revealed.contains(&id) || self.observed.contains_key(&id) {
            return false;
        }
        let threshold = match kind {
            RevealKind::FadeIn => self.settings.fade_threshold,
            RevealKind::Counter(_) => self.settings.counter_threshold,
            RevealKind::LazyImage { .. } => crate::constants::reveal::LAZY_IMAGE_THRESHOLD,
        };
        self.observed.insert(id, Observed { bounds, kind, threshold });
        true
    }

    /// Feed a scroll sample
    pub fn on_scroll(&mut self, scroll_y: f64, now: Duration) -> Vec<RevealEffect> {
        self.latest_scroll = scroll_y;
        match self.mode {
            ObservationMode::Observer => self.check_now(now),
            ObservationMode::ScrollFallback => {
                self.fallback.call(now);
                Vec::new()
            }
        }
    }

    /// Run the debounced fallback check if it is due
    pub fn poll(&mut self, now: Duration) -> Vec<RevealEffect> {
        if self.mode == ObservationMode::ScrollFallback && self.fallback.fire_if_due(now) {
            self.check_now(now)
        } else {
            Vec::new()
        }
    }

    /// Immediate visibility check of every subscribed element at the latest scroll offset
    pub fn check_now(&mut self, now: Duration) -> Vec<RevealEffect> {
        let scroll_y = self.latest_scroll;
        let ids: Vec<ElementId> = self.observed.keys().copied().collect();

        let mut effects = Vec::new();
        for id in ids {
            let Some(observed) = self.observed.get(&id) else { continue };
            let effect = match self.mode {
                ObservationMode::Observer => {
                    let ratio = visible_fraction(observed.bounds, scroll_y, self.viewport);
                    self.on_intersection(id, ratio, now)
                }
                ObservationMode::ScrollFallback => {
                    if is_in_viewport(observed.bounds, scroll_y, self.viewport) {
                        self.reveal(id, now)
                    } else {
                        None
                    }
                }
            };
            effects.extend(effect);
        }
        effects
    }

    /// Observer callback: `ratio` of the element is currently visible.
    /// Nothing on screen never counts, even with a zero threshold.
    pub fn on_intersection(&mut self, id: ElementId, ratio: f64, now: Duration) -> Option<RevealEffect> {
        let threshold = self.observed.get(&id)?.threshold;
        if ratio > 0.0 && ratio >= threshold {
            self.reveal(id, now)
        } else {
            None
        }
    }

    /// Advance running counters; returns the frames that changed
    pub fn tick(&mut self, now: Duration) -> Vec<(ElementId, CounterFrame)> {
        let mut frames = Vec::new();
        for (id, animation) in self.counters.iter_mut() {
            if let Some(frame) = animation.tick(now) {
                self.counter_text.insert(*id, frame.text.clone());
                frames.push((*id, frame));
            }
        }
        self.counters.retain(|_, animation| !animation.is_finished());
        frames
    }

    /// New window size. The observer re-evaluates every subscribed element
    /// at once; the fallback schedules its debounced check.
    pub fn resize(&mut self, viewport: Viewport, now: Duration) -> Vec<RevealEffect> {
        self.viewport = viewport;
        match self.mode {
            ObservationMode::Observer => self.check_now(now),
            ObservationMode::ScrollFallback => {
                self.fallback.call(now);
                Vec::new()
            }
        }
    }

    pub fn is_revealed(&self, id: ElementId) -> bool {
        self.revealed.contains(&id)
    }

    pub fn revealed(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.revealed.iter().copied()
    }

    pub fn counter_texts(&self) -> &BTreeMap<ElementId, String> {
        &self.counter_text
    }

    /// Sources swapped into lazy images so far
    pub fn loaded_images(&self) -> &BTreeMap<ElementId, String> {
        &self.images
    }

    /// Elements still waiting for their first reveal
    pub fn pending_count(&self) -> usize {
        self.observed.len()
    }

    /// No counters running and no fallback check scheduled
    pub fn is_idle(&self) -> bool {
        self.counters.is_empty() && !self.fallback.is_pending()
    }

    fn reveal(&mut self, id: ElementId, now: Duration) -> Option<RevealEffect> {
        let observed = self.observed.remove(&id)?;
        if !self.revealed.insert(id) {
            return None;
        }

        match observed.kind {
            RevealKind::FadeIn => {
                debug!(element = %id, class = crate::constants::reveal::FADE_IN_CLASS, "Element revealed");
                Some(RevealEffect::FadedIn(id))
            }
            RevealKind::Counter(spec) => {
                info!(element = %id, counter_target = spec.target, "Starting counter animation");
                let animation = CounterAnimation::new(
                    spec,
                    now,
                    Duration::from_millis(self.settings.counter_duration_ms),
                    self.settings.counter_steps,
                );
                self.counters.insert(id, animation);
                Some(RevealEffect::CounterStarted(id))
            }
            RevealKind::LazyImage { src } => {
                debug!(element = %id, src = %src, class = crate::constants::reveal::LAZY_CLASS, "Loading deferred image");
                self.images.insert(id, src.clone());
                Some(RevealEffect::ImageLoaded { id, src })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::at_ms;

    const VIEWPORT: Viewport = Viewport { width: 1000.0, height: 800.0 };

    fn animator(mode: ObservationMode) -> VisibilityAnimator {
        VisibilityAnimator::new(mode, VIEWPORT, RevealSettings::default())
    }

    fn counter(text: &str) -> RevealKind {
        RevealKind::Counter(CounterSpec::parse(text, None).unwrap())
    }

    #[test]
    fn test_fade_in_reveals_once() {
        let mut animator = animator(ObservationMode::Observer);
        let card = ElementId(1);
        animator.register(card, Rect::new(0.0, 1000.0, 300.0, 200.0), RevealKind::FadeIn);

        assert!(animator.on_scroll(0.0, at_ms(0)).is_empty());

        // 20px of 200px visible = 0.1, exactly the fade threshold
        let effects = animator.on_scroll(220.0, at_ms(10));
        assert_eq!(effects, vec![RevealEffect::FadedIn(card)]);

        // Leave and re-enter the viewport
        assert!(animator.on_scroll(0.0, at_ms(20)).is_empty());
        assert!(animator.on_scroll(400.0, at_ms(30)).is_empty());
        assert!(animator.is_revealed(card));
        assert_eq!(animator.pending_count(), 0);
    }

    #[test]
    fn test_counter_waits_for_half_visibility() {
        let mut animator = animator(ObservationMode::Observer);
        let stat = ElementId(7);
        animator.register(stat, Rect::new(0.0, 900.0, 200.0, 100.0), counter("50+"));

        // 40% visible
        assert!(animator.on_scroll(140.0, at_ms(0)).is_empty());
        // 50% visible
        assert_eq!(animator.on_scroll(150.0, at_ms(10)), vec![RevealEffect::CounterStarted(stat)]);
    }

    #[test]
    fn test_counter_runs_to_target_and_never_restarts() {
        let mut animator = animator(ObservationMode::Observer);
        let stat = ElementId(3);
        animator.register(stat, Rect::new(0.0, 100.0, 200.0, 100.0), counter("500+"));

        assert_eq!(animator.check_now(at_ms(0)), vec![RevealEffect::CounterStarted(stat)]);

        for now in (0..=2500).step_by(16) {
            animator.tick(at_ms(now));
        }
        assert_eq!(animator.counter_texts().get(&stat).map(String::as_str), Some("500+"));
        assert!(animator.is_idle());
        assert!(animator.tick(at_ms(3000)).is_empty());

        // Second visibility entry does not re-animate
        animator.on_scroll(2000.0, at_ms(3100));
        assert!(animator.on_scroll(0.0, at_ms(3200)).is_empty());
        assert!(animator.tick(at_ms(3300)).is_empty());
        assert_eq!(animator.counter_texts().get(&stat).map(String::as_str), Some("500+"));

        // Re-registering a revealed element is refused
        assert!(!animator.register(stat, Rect::new(0.0, 100.0, 200.0, 100.0), counter("500+")));
    }

    #[test]
    fn test_lazy_image_loads_on_first_pixel() {
        let mut animator = animator(ObservationMode::Observer);
        let hero = ElementId(12);
        let kind = RevealKind::LazyImage {
            src: "assets/images/hero-research.jpg".to_string(),
        };
        animator.register(hero, Rect::new(0.0, 1000.0, 400.0, 300.0), kind);

        // Bottom edge of the viewport touches the image top, nothing visible yet
        assert!(animator.on_scroll(200.0, at_ms(0)).is_empty());

        let effects = animator.on_scroll(201.0, at_ms(10));
        assert_eq!(
            effects,
            vec![RevealEffect::ImageLoaded {
                id: hero,
                src: "assets/images/hero-research.jpg".to_string()
            }]
        );
        assert_eq!(
            animator.loaded_images().get(&hero).map(String::as_str),
            Some("assets/images/hero-research.jpg")
        );

        assert!(animator.on_scroll(0.0, at_ms(20)).is_empty());
        assert!(animator.on_scroll(300.0, at_ms(30)).is_empty());
        assert_eq!(animator.loaded_images().len(), 1);
    }

    #[test]
    fn test_taller_window_reveals_without_scrolling() {
        let mut animator = animator(ObservationMode::Observer);
        let card = ElementId(1);
        animator.register(card, Rect::new(100.0, 900.0, 340.0, 260.0), RevealKind::FadeIn);
        assert!(animator.check_now(at_ms(0)).is_empty());

        let effects = animator.resize(Viewport::new(1000.0, 1200.0), at_ms(50));
        assert_eq!(effects, vec![RevealEffect::FadedIn(card)]);
    }

    #[test]
    fn test_fallback_resize_waits_for_debounce() {
        let mut animator = animator(ObservationMode::ScrollFallback);
        let card = ElementId(1);
        animator.register(card, Rect::new(100.0, 900.0, 340.0, 260.0), RevealKind::FadeIn);

        assert!(animator.resize(Viewport::new(1000.0, 1200.0), at_ms(0)).is_empty());
        assert!(!animator.is_idle());
        assert_eq!(animator.poll(at_ms(50)), vec![RevealEffect::FadedIn(card)]);
    }

    #[test]
    fn test_intersection_callback_ignores_unknown_elements() {
        let mut animator = animator(ObservationMode::Observer);
        assert_eq!(animator.on_intersection(ElementId(99), 1.0, at_ms(0)), None);
    }

    #[test]
    fn test_fallback_is_debounced_and_needs_full_visibility() {
        let mut animator = animator(ObservationMode::ScrollFallback);
        let card = ElementId(2);
        animator.register(card, Rect::new(0.0, 900.0, 300.0, 200.0), RevealKind::FadeIn);

        // At 200 the card spans 700..900 on screen, so it is cut off by the fold
        assert!(animator.on_scroll(200.0, at_ms(0)).is_empty());
        assert!(animator.poll(at_ms(50)).is_empty());

        animator.on_scroll(250.0, at_ms(100));
        animator.on_scroll(300.0, at_ms(120));
        assert!(animator.poll(at_ms(150)).is_empty());
        assert_eq!(animator.poll(at_ms(170)), vec![RevealEffect::FadedIn(card)]);

        animator.on_scroll(300.0, at_ms(200));
        assert!(animator.poll(at_ms(260)).is_empty());
    }
}
