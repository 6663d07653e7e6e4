//! Default thresholds, timings and labels of the landing page
//!
//! Grouped by the component that reads them. Anything tunable is copied into
//! [`crate::config::SiteConfig`] and read from there at runtime.

/// Scroll-driven navigation constants
pub mod scroll {
    /// Offset (px) past which the navbar switches to its "scrolled" style
    pub const NAVBAR_SCROLLED_OFFSET: f64 = 50.0;

    /// Height (px) of the fixed header, used for section hit-testing and scroll targets
    pub const DEFAULT_HEADER_HEIGHT: f64 = 70.0;

    /// Offset (px) past which the back-to-top button is shown
    pub const BACK_TO_TOP_OFFSET: f64 = 300.0;

    /// Trailing-edge debounce for scroll handlers
    pub const DEBOUNCE_MS: u64 = 10;
}

/// Mobile menu constants
pub mod menu {
    /// Viewport width (px) above which the mobile menu is force-closed
    pub const DESKTOP_BREAKPOINT: u32 = 768;

    /// Key name that closes an open menu
    pub const CLOSE_KEY: &str = "Escape";
}

/// Reveal and counter animation constants
pub mod reveal {
    /// Visible fraction that triggers a fade-in reveal
    pub const FADE_THRESHOLD: f64 = 0.1;

    /// Visible fraction that triggers a counter animation
    pub const COUNTER_THRESHOLD: f64 = 0.5;

    /// Total counter interpolation time
    pub const COUNTER_DURATION_MS: u64 = 2000;

    /// Number of interpolation steps over the counter duration
    pub const COUNTER_STEPS: u32 = 60;

    /// Debounce used by the scroll-driven fallback when no observer is available
    pub const FALLBACK_DEBOUNCE_MS: u64 = 50;

    /// CSS class applied to revealed fade-in elements
    pub const FADE_IN_CLASS: &str = "fade-in-up";

    /// Any visible pixel loads a deferred image
    pub const LAZY_IMAGE_THRESHOLD: f64 = 0.0;

    /// Placeholder class removed once the real image source is set
    pub const LAZY_CLASS: &str = "lazy";
}

/// Hero typing effect constants
pub mod typing {
    /// Delay between typed characters (deletion runs at half this)
    pub const SPEED_MS: u64 = 150;

    /// Pause once a phrase is fully typed
    pub const HOLD_MS: u64 = 2000;

    /// Pause before typing the next phrase
    pub const NEXT_PHRASE_MS: u64 = 500;

    /// Phrases cycled in the hero banner
    pub const PHRASES: [&str; 4] = [
        "Advancing Knowledge",
        "Driving Innovation",
        "Building Future",
        "Making Impact",
    ];
}

/// Form validation and submission constants
pub mod forms {
    /// Minimum trimmed length of the contact name
    pub const MIN_NAME_CHARS: usize = 2;

    /// Minimum trimmed length of the contact message
    pub const MIN_MESSAGE_CHARS: usize = 10;

    /// Maximum attachment size (5 MB)
    pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

    /// MIME types accepted for project attachments
    pub const ALLOWED_UPLOAD_TYPES: [&str; 5] = [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "application/pdf",
    ];

    /// Subject used when the contact form leaves it blank
    pub const DEFAULT_CONTACT_SUBJECT: &str = "Contact Form Submission";

    /// Storage folder for project attachments
    pub const UPLOAD_FOLDER: &str = "projects";
}

/// Notification constants
pub mod notify {
    /// Auto-dismiss delay for transient notices
    pub const AUTO_DISMISS_MS: u64 = 5000;
}

/// Config file location
pub mod config {
    /// Directory under the platform config/data dir
    pub const APP_DIR: &str = "premier-site";

    /// Config file name
    pub const FILENAME: &str = "config.json";
}

/// Local back-end storage layout
pub mod storage {
    /// Submitted projects
    pub const PROJECTS_FILE: &str = "projects.json";

    /// Contact form messages
    pub const CONTACTS_FILE: &str = "contacts.json";

    /// Root directory for uploaded attachments
    pub const UPLOADS_DIR: &str = "uploads";

    /// Status given to freshly submitted projects
    pub const DEFAULT_PROJECT_STATUS: &str = "pending";
}
