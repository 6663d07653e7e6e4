//! The page: every component attached to one document
//!
//! Events arrive with a page-clock timestamp. Timers that fell due before the
//! event run first, then the event is routed to the components that react to
//! it. Failures while handling an event are reported and the page keeps going.
//!
//! The page also owns its three forms and the project list, so every notice a
//! form raises lands in the one notification area the page shows.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::backend::{ContactBackend, FileStorage, ProjectStore};
use crate::config::SiteConfig;
use crate::error::SiteError;
use crate::forms::{ContactForm, FileAttachment, FilePolicy, NewsletterForm, ProjectForm};
use crate::geometry::{Rect, Viewport};
use crate::menu::{MenuController, MenuEvent, MenuView};
use crate::notify::{Notification, NotificationCenter};
use crate::projects::ProjectsPanel;
use crate::reveal::{
    CounterSpec, ElementId, ObservationMode, RevealEffect, RevealKind, TypingEffect, VisibilityAnimator,
};
use crate::scroll::{ScrollCoordinator, ScrollView, Section};

/// An element that animates on first sight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealElement {
    pub id: ElementId,
    pub bounds: Rect,
    pub kind: RevealKind,
}

/// Static geometry of the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub sections: Vec<Section>,
    pub document_height: f64,
    pub viewport: Viewport,
    pub elements: Vec<RevealElement>,
    /// False for pages that only get the debounced scroll fallback
    pub observer_supported: bool,
    /// Run the hero typing effect
    pub typing: bool,
}

impl Default for PageLayout {
    /// The club landing page
    fn default() -> Self {
        let sections = vec![
            Section::new("home", 0.0, 800.0),
            Section::new("about", 800.0, 900.0),
            Section::new("research", 1700.0, 1000.0),
            Section::new("projects", 2700.0, 1100.0),
            Section::new("submit-project", 3800.0, 700.0),
            Section::new("contact", 4500.0, 800.0),
        ];

        let counter = |target: u64, suffix: &str| {
            RevealKind::Counter(CounterSpec {
                target,
                suffix: suffix.to_string(),
            })
        };
        let elements = vec![
            RevealElement { id: ElementId(1), bounds: Rect::new(100.0, 900.0, 340.0, 260.0), kind: RevealKind::FadeIn },
            RevealElement { id: ElementId(2), bounds: Rect::new(470.0, 900.0, 340.0, 260.0), kind: RevealKind::FadeIn },
            RevealElement { id: ElementId(3), bounds: Rect::new(840.0, 900.0, 340.0, 260.0), kind: RevealKind::FadeIn },
            RevealElement { id: ElementId(4), bounds: Rect::new(100.0, 1300.0, 250.0, 120.0), kind: counter(150, "+") },
            RevealElement { id: ElementId(5), bounds: Rect::new(400.0, 1300.0, 250.0, 120.0), kind: counter(25, "+") },
            RevealElement { id: ElementId(6), bounds: Rect::new(700.0, 1300.0, 250.0, 120.0), kind: counter(98, "%") },
            RevealElement { id: ElementId(7), bounds: Rect::new(100.0, 2800.0, 540.0, 400.0), kind: RevealKind::FadeIn },
            RevealElement { id: ElementId(8), bounds: Rect::new(660.0, 2800.0, 540.0, 400.0), kind: RevealKind::FadeIn },
            RevealElement {
                id: ElementId(9),
                bounds: Rect::new(100.0, 1800.0, 1000.0, 500.0),
                kind: RevealKind::LazyImage {
                    src: "assets/images/hero-research.jpg".to_string(),
                },
            },
        ];

        Self {
            sections,
            document_height: 5300.0,
            viewport: Viewport::default(),
            elements,
            observer_supported: true,
            typing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClickTarget {
    Hamburger,
    /// Inside the open menu panel, not on a link
    MenuPanel,
    NavLink { href: String },
    BackToTop,
    /// Anywhere outside the menu panel and hamburger
    Outside,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    Scroll {
        offset_y: f64,
    },
    Resize {
        width: f64,
        height: f64,
        #[serde(default)]
        document_height: Option<f64>,
    },
    Click {
        target: ClickTarget,
    },
    KeyDown {
        key: String,
    },
    DismissNotification {
        id: u64,
    },
    /// Newsletter form submitted with this address
    NewsletterSignup {
        email: String,
    },
}

/// Everything the page currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSnapshot {
    pub at_ms: u64,
    pub scroll: ScrollView,
    pub menu: MenuView,
    pub revealed: Vec<ElementId>,
    pub counters: BTreeMap<ElementId, String>,
    pub images: BTreeMap<ElementId, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typing_text: Option<String>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug)]
pub struct Page {
    scroll: ScrollCoordinator,
    menu: MenuController,
    reveal: VisibilityAnimator,
    typing: Option<TypingEffect>,
    notices: NotificationCenter,
    contact: ContactForm,
    project: ProjectForm,
    newsletter: NewsletterForm,
    projects: ProjectsPanel,
    viewport: Viewport,
    document_height: f64,
    now: Duration,
}

impl Page {
    pub fn new(layout: &PageLayout, config: &SiteConfig) -> Self {
        let mode = if layout.observer_supported {
            ObservationMode::Observer
        } else {
            ObservationMode::ScrollFallback
        };

        let mut reveal = VisibilityAnimator::new(mode, layout.viewport, config.reveal.clone());
        for element in &layout.elements {
            if !reveal.register(element.id, element.bounds, element.kind.clone()) {
                debug!(id = %element.id, "Duplicate reveal element ignored");
            }
        }

        let typing = if layout.typing {
            TypingEffect::new(
                config.typing.phrases.clone(),
                Duration::from_millis(config.typing.speed_ms),
                Duration::ZERO,
            )
        } else {
            None
        };

        info!(
            sections = layout.sections.len(),
            elements = layout.elements.len(),
            mode = ?mode,
            "Page attached"
        );

        let mut page = Self {
            scroll: ScrollCoordinator::new(
                layout.sections.clone(),
                layout.document_height,
                layout.viewport.height,
                config.scroll.clone(),
            ),
            menu: MenuController::new(&config.menu),
            reveal,
            typing,
            notices: NotificationCenter::new(Duration::from_millis(config.forms.notification_ms)),
            contact: ContactForm::new(),
            project: ProjectForm::new(FilePolicy::from_settings(&config.forms)),
            newsletter: NewsletterForm::new(),
            projects: ProjectsPanel::new(),
            viewport: layout.viewport,
            document_height: layout.document_height,
            now: Duration::ZERO,
        };

        // Elements already on screen at load are revealed without a scroll
        if mode == ObservationMode::Observer {
            log_effects(page.reveal.check_now(Duration::ZERO));
        }
        page
    }

    /// Fire due timers, then apply the event
    pub fn handle_event(&mut self, event: &PageEvent, now: Duration) -> Result<()> {
        self.tick(now);

        match event {
            PageEvent::Scroll { offset_y } => self.scroll_to(*offset_y, now),
            PageEvent::Resize {
                width,
                height,
                document_height,
            } => {
                if *width <= 0.0 || *height <= 0.0 {
                    bail!("Invalid viewport size {width}x{height}");
                }
                self.viewport = Viewport::new(*width, *height);
                if let Some(document_height) = document_height {
                    self.document_height = *document_height;
                }
                self.scroll.resize(*height, self.document_height);
                log_effects(self.reveal.resize(self.viewport, now));
                self.menu.handle(&MenuEvent::Resize { width: *width as u32 });
            }
            PageEvent::Click { target } => self.click(target, now)?,
            PageEvent::KeyDown { key } => {
                self.menu.handle(&MenuEvent::Key(key.clone()));
            }
            PageEvent::DismissNotification { id } => {
                if !self.notices.dismiss(*id) {
                    debug!(id, "Notification already gone");
                }
            }
            PageEvent::NewsletterSignup { email } => {
                self.newsletter.set_email(email);
                // The form's own notice already tells the visitor what was wrong
                if let Err(err) = self.submit_newsletter(now) {
                    debug!(error = %err, "Newsletter signup rejected");
                }
            }
        }
        Ok(())
    }

    /// Handle an event, reporting instead of propagating failures
    pub fn dispatch(&mut self, event: &PageEvent, now: Duration) {
        if let Err(e) = self.handle_event(event, now) {
            report_runtime_error(&e);
        }
    }

    /// Run every timer that is due; returns true when anything visible changed
    pub fn tick(&mut self, now: Duration) -> bool {
        self.now = self.now.max(now);
        let mut changed = self.scroll.poll(now);

        let effects = self.reveal.poll(now);
        changed |= !effects.is_empty();
        log_effects(effects);

        changed |= !self.reveal.tick(now).is_empty();

        if let Some(typing) = &mut self.typing {
            changed |= typing.tick(now);
        }

        changed |= !self.notices.expire(now).is_empty();
        changed
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            at_ms: self.now.as_millis() as u64,
            scroll: self.scroll.view().clone(),
            menu: self.menu.view(),
            revealed: self.reveal.revealed().collect(),
            counters: self.reveal.counter_texts().clone(),
            images: self.reveal.loaded_images().clone(),
            typing_text: self.typing.as_ref().map(|t| t.text().to_string()),
            notifications: self.notices.active().to_vec(),
        }
    }

    /// No pending debounce, no running counter, no visible notice
    pub fn is_idle(&self) -> bool {
        !self.scroll.has_pending() && self.reveal.is_idle() && self.notices.active().is_empty()
    }

    pub fn notices(&self) -> &NotificationCenter {
        &self.notices
    }

    pub fn menu(&self) -> &MenuController {
        &self.menu
    }

    pub fn scroll(&self) -> &ScrollCoordinator {
        &self.scroll
    }

    pub fn reveal(&self) -> &VisibilityAnimator {
        &self.reveal
    }

    pub fn contact_form(&self) -> &ContactForm {
        &self.contact
    }

    pub fn contact_form_mut(&mut self) -> &mut ContactForm {
        &mut self.contact
    }

    pub fn project_form(&self) -> &ProjectForm {
        &self.project
    }

    pub fn project_form_mut(&mut self) -> &mut ProjectForm {
        &mut self.project
    }

    pub fn newsletter_form_mut(&mut self) -> &mut NewsletterForm {
        &mut self.newsletter
    }

    pub fn projects(&self) -> &ProjectsPanel {
        &self.projects
    }

    pub async fn submit_contact<B: ContactBackend + ?Sized>(
        &mut self,
        backend: &B,
        now: Duration,
    ) -> Result<(), SiteError> {
        self.tick(now);
        self.contact.submit(backend, &mut self.notices, now).await
    }

    /// Rejections show a notice and leave any earlier file selected
    pub fn select_project_file(&mut self, file: FileAttachment, now: Duration) -> Result<(), SiteError> {
        self.tick(now);
        self.project.select_file(file, &mut self.notices, now)
    }

    pub async fn submit_project<B>(&mut self, backend: &B, now: Duration) -> Result<String, SiteError>
    where
        B: FileStorage + ProjectStore + ?Sized,
    {
        self.tick(now);
        self.project
            .submit(backend, &mut self.projects, &mut self.notices, now)
            .await
    }

    pub fn submit_newsletter(&mut self, now: Duration) -> Result<(), SiteError> {
        self.tick(now);
        self.newsletter.submit(&mut self.notices, now)
    }

    pub async fn refresh_projects<S: ProjectStore + ?Sized>(&mut self, store: &S) -> Result<(), SiteError> {
        self.projects.refresh(store).await
    }

    fn click(&mut self, target: &ClickTarget, now: Duration) -> Result<()> {
        match target {
            ClickTarget::Hamburger => {
                self.menu.handle(&MenuEvent::Toggle);
            }
            ClickTarget::MenuPanel => {}
            ClickTarget::Outside => {
                self.menu.handle(&MenuEvent::OutsideClick);
            }
            ClickTarget::BackToTop => self.scroll_to(0.0, now),
            ClickTarget::NavLink { href } => {
                self.menu.handle(&MenuEvent::LinkClicked);

                // Only in-page anchors scroll; other links leave the page
                if let Some(id) = href.strip_prefix('#') {
                    let Some(target) = self.scroll.scroll_target(id) else {
                        bail!("No section for link {href}");
                    };
                    debug!(href = %href, offset = target, "Scrolling to section");
                    self.scroll_to(target, now);
                }
            }
        }
        Ok(())
    }

    fn scroll_to(&mut self, offset_y: f64, now: Duration) {
        let max = (self.document_height - self.viewport.height).max(0.0);
        let offset_y = offset_y.clamp(0.0, max);
        self.scroll.on_scroll(offset_y, now);
        let effects = self.reveal.on_scroll(offset_y, now);
        log_effects(effects);
    }
}

fn log_effects(effects: Vec<RevealEffect>) {
    for effect in effects {
        debug!(effect = ?effect, "Reveal");
    }
}

/// Page-level error sink: log and carry on
pub fn report_runtime_error(err: &anyhow::Error) {
    error!(error = %format!("{err:#}"), "Runtime error while handling page event");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::RecordingBackend;
    use crate::projects::PanelState;
    use crate::timer::at_ms;

    fn page() -> Page {
        Page::new(&PageLayout::default(), &SiteConfig::default())
    }

    fn scroll(offset_y: f64) -> PageEvent {
        PageEvent::Scroll { offset_y }
    }

    #[test]
    fn test_initial_snapshot() {
        let page = page();
        let snapshot = page.snapshot();

        assert!(!snapshot.scroll.navbar_scrolled);
        assert_eq!(snapshot.scroll.active_link.as_deref(), Some("#home"));
        assert!(!snapshot.menu.panel_active);
        assert!(snapshot.revealed.is_empty());
    }

    #[test]
    fn test_scroll_then_debounce() {
        let mut page = page();
        page.handle_event(&scroll(1000.0), at_ms(100)).unwrap();

        // Progress is immediate, the rest waits for the debounce
        assert!(page.snapshot().scroll.progress_percent > 0.0);
        assert_eq!(page.snapshot().scroll.active_link.as_deref(), Some("#home"));

        page.tick(at_ms(110));
        let view = page.snapshot().scroll;
        assert!(view.navbar_scrolled);
        assert!(view.back_to_top_visible);
        assert_eq!(view.active_link.as_deref(), Some("#about"));
    }

    #[test]
    fn test_counters_reveal_and_finish() {
        let mut page = page();
        page.handle_event(&scroll(800.0), at_ms(0)).unwrap();

        let snapshot = page.snapshot();
        assert!(snapshot.revealed.contains(&ElementId(4)));
        assert!(snapshot.revealed.contains(&ElementId(1)));

        page.tick(at_ms(2100));
        let counters = page.snapshot().counters;
        assert_eq!(counters.get(&ElementId(4)).map(String::as_str), Some("150+"));
        assert_eq!(counters.get(&ElementId(6)).map(String::as_str), Some("98%"));
    }

    #[test]
    fn test_nav_link_closes_menu_and_scrolls() {
        let mut page = page();
        page.handle_event(&PageEvent::Click { target: ClickTarget::Hamburger }, at_ms(0)).unwrap();
        assert!(page.menu().scroll_locked());

        let link = PageEvent::Click {
            target: ClickTarget::NavLink { href: "#research".to_string() },
        };
        page.handle_event(&link, at_ms(10)).unwrap();
        assert!(!page.menu().is_open());

        page.tick(at_ms(30));
        assert_eq!(page.snapshot().scroll.active_link.as_deref(), Some("#research"));
    }

    #[test]
    fn test_unknown_anchor_is_an_error_but_menu_still_closes() {
        let mut page = page();
        page.handle_event(&PageEvent::Click { target: ClickTarget::Hamburger }, at_ms(0)).unwrap();

        let link = PageEvent::Click {
            target: ClickTarget::NavLink { href: "#missing".to_string() },
        };
        assert!(page.handle_event(&link, at_ms(5)).is_err());
        assert!(!page.menu().is_open());

        // dispatch swallows the same failure
        page.dispatch(&link, at_ms(6));
    }

    #[test]
    fn test_escape_and_wide_resize_close_menu() {
        let mut page = page();
        let toggle = PageEvent::Click { target: ClickTarget::Hamburger };

        page.handle_event(&toggle, at_ms(0)).unwrap();
        page.handle_event(&PageEvent::KeyDown { key: "Escape".to_string() }, at_ms(1)).unwrap();
        assert!(!page.menu().is_open());

        page.handle_event(&toggle, at_ms(2)).unwrap();
        let narrow = PageEvent::Resize { width: 600.0, height: 800.0, document_height: None };
        page.handle_event(&narrow, at_ms(3)).unwrap();
        assert!(page.menu().is_open());

        let wide = PageEvent::Resize { width: 1024.0, height: 800.0, document_height: None };
        page.handle_event(&wide, at_ms(4)).unwrap();
        assert!(!page.menu().is_open());
        assert!(!page.menu().scroll_locked());
    }

    #[test]
    fn test_fallback_mode_waits_for_quiet_period() {
        let layout = PageLayout {
            observer_supported: false,
            typing: false,
            ..PageLayout::default()
        };
        let mut page = Page::new(&layout, &SiteConfig::default());

        page.handle_event(&scroll(800.0), at_ms(0)).unwrap();
        page.handle_event(&scroll(820.0), at_ms(30)).unwrap();
        assert!(page.snapshot().revealed.is_empty());

        page.tick(at_ms(80));
        assert!(page.reveal().is_revealed(ElementId(1)));
    }

    #[test]
    fn test_event_json_shape() {
        let event: PageEvent = serde_json::from_str(
            r##"{"type":"click","target":{"kind":"nav_link","href":"#about"}}"##,
        )
        .unwrap();
        assert_eq!(
            event,
            PageEvent::Click {
                target: ClickTarget::NavLink { href: "#about".to_string() }
            }
        );

        let event: PageEvent =
            serde_json::from_str(r#"{"type":"resize","width":800,"height":600}"#).unwrap();
        assert!(matches!(event, PageEvent::Resize { document_height: None, .. }));
    }

    #[test]
    fn test_taller_window_reveals_without_scroll() {
        let layout = PageLayout {
            typing: false,
            ..PageLayout::default()
        };
        let mut page = Page::new(&layout, &SiteConfig::default());
        assert!(!page.reveal().is_revealed(ElementId(1)));

        let taller = PageEvent::Resize { width: 1280.0, height: 1200.0, document_height: None };
        page.handle_event(&taller, at_ms(0)).unwrap();
        page.tick(at_ms(500));

        assert!(page.reveal().is_revealed(ElementId(1)));
        assert!(page.reveal().is_revealed(ElementId(3)));
        assert!(!page.reveal().is_revealed(ElementId(7)));
    }

    #[test]
    fn test_lazy_image_source_in_snapshot() {
        let mut page = page();
        assert!(page.snapshot().images.is_empty());

        page.handle_event(&scroll(1100.0), at_ms(0)).unwrap();
        let images = page.snapshot().images;
        assert_eq!(
            images.get(&ElementId(9)).map(String::as_str),
            Some("assets/images/hero-research.jpg")
        );
    }

    #[test]
    fn test_newsletter_notice_shown_and_dismissed() {
        let mut page = page();
        let signup = PageEvent::NewsletterSignup { email: "reader@example.org".to_string() };
        page.handle_event(&signup, at_ms(0)).unwrap();

        let notices = page.snapshot().notifications;
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Thank you for subscribing to our newsletter!");

        page.handle_event(&PageEvent::DismissNotification { id: notices[0].id }, at_ms(100)).unwrap();
        assert!(page.snapshot().notifications.is_empty());
    }

    #[test]
    fn test_bad_signup_shows_error_and_expires() {
        let mut page = page();
        let signup = PageEvent::NewsletterSignup { email: "reader@".to_string() };
        page.handle_event(&signup, at_ms(0)).unwrap();
        assert_eq!(page.notices().latest().unwrap().kind, crate::notify::NotificationKind::Error);

        page.tick(at_ms(5000));
        assert!(page.snapshot().notifications.is_empty());
    }

    #[tokio::test]
    async fn test_form_notices_land_on_page() {
        let backend = RecordingBackend::default();
        let mut page = page();

        let form = page.contact_form_mut();
        form.set_field("name", "Ada Lovelace");
        form.set_field("email", "ada@example.org");
        form.set_field("message", "I would like to join the club.");
        page.submit_contact(&backend, at_ms(10)).await.unwrap();

        let rejected = FileAttachment::new("tool.exe", "application/x-msdownload", vec![0; 16]);
        assert!(page.select_project_file(rejected, at_ms(20)).is_err());

        let messages: Vec<String> = page.snapshot().notifications.into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            vec![
                "Message sent successfully! We'll get back to you soon.".to_string(),
                "File type not allowed. Please upload images or PDF files.".to_string(),
            ]
        );
        assert!(page.contact_form().fields().is_empty());
    }

    #[tokio::test]
    async fn test_project_submit_refreshes_page_list() {
        let backend = RecordingBackend::default();
        let mut page = page();

        let form = page.project_form_mut();
        form.set_field("title", "Campus Screening Survey");
        form.set_field("description", "Uptake of screening among students.");
        let poster = FileAttachment::new("poster.png", "image/png", vec![1; 256]);
        page.select_project_file(poster, at_ms(0)).unwrap();

        let id = page.submit_project(&backend, at_ms(10)).await.unwrap();

        assert_eq!(id, "project-1");
        assert!(matches!(page.projects().state(), PanelState::Loaded(cards) if cards.len() == 1));
        assert!(page.project_form().selected_file().is_none());
        assert_eq!(page.notices().active().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_list_load_shows_error_state() {
        let backend = RecordingBackend {
            fail_list: Some(crate::error::CollaboratorError::new("unavailable", "offline")),
            ..Default::default()
        };
        let mut page = page();
        assert_eq!(page.projects().state(), &PanelState::Loading);

        assert!(page.refresh_projects(&backend).await.is_err());
        assert_eq!(page.projects().state(), &PanelState::Error);
    }

    #[test]
    fn test_idle_after_everything_settles() {
        let layout = PageLayout {
            typing: false,
            ..PageLayout::default()
        };
        let mut page = Page::new(&layout, &SiteConfig::default());
        page.handle_event(&scroll(800.0), at_ms(0)).unwrap();
        assert!(!page.is_idle());

        page.tick(at_ms(3000));
        assert!(page.is_idle());
    }
}
