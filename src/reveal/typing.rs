use std::time::Duration;

use crate::constants::typing::{HOLD_MS, NEXT_PHRASE_MS};

/// Hero banner effect: types a phrase, holds it, deletes it, moves to the next
#[derive(Debug, Clone)]
pub struct TypingEffect {
    phrases: Vec<String>,
    phrase: usize,
    chars: usize,
    deleting: bool,
    speed: Duration,
    next_at: Duration,
    text: String,
}

impl TypingEffect {
    /// `None` when there is nothing to type
    pub fn new(phrases: Vec<String>, speed: Duration, start: Duration) -> Option<Self> {
        if phrases.is_empty() {
            return None;
        }
        Some(Self {
            phrases,
            phrase: 0,
            chars: 0,
            deleting: false,
            speed,
            next_at: start,
            text: String::new(),
        })
    }

    /// Advance one character; returns the delay before the next step
    pub fn step(&mut self) -> Duration {
        let current = &self.phrases[self.phrase];
        let len = current.chars().count();

        if self.deleting {
            self.chars = self.chars.saturating_sub(1);
        } else {
            self.chars = (self.chars + 1).min(len);
        }
        self.text = current.chars().take(self.chars).collect();

        let mut delay = if self.deleting { self.speed / 2 } else { self.speed };

        if !self.deleting && self.chars == len {
            delay = Duration::from_millis(HOLD_MS);
            self.deleting = true;
        } else if self.deleting && self.chars == 0 {
            self.deleting = false;
            self.phrase = (self.phrase + 1) % self.phrases.len();
            delay = Duration::from_millis(NEXT_PHRASE_MS);
        }

        delay
    }

    /// Step when due; returns true when the text changed
    pub fn tick(&mut self, now: Duration) -> bool {
        if now < self.next_at {
            return false;
        }
        let delay = self.step();
        self.next_at = now + delay;
        true
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn phrase_index(&self) -> usize {
        self.phrase
    }
}
