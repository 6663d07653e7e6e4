use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Target value and display suffix of an animated statistic, e.g. `500+`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSpec {
    pub target: u64,
    pub suffix: String,
}

impl CounterSpec {
    /// Parse from the element text and an optional explicit `data-target`
    ///
    /// Without `data_target` the digits of `text` form the target. The suffix
    /// is every non-digit character of `text`.
    pub fn parse(text: &str, data_target: Option<&str>) -> Option<Self> {
        let suffix: String = text.chars().filter(|c| !c.is_ascii_digit()).collect();
        let target = match data_target {
            Some(raw) => raw.trim().parse().ok()?,
            None => {
                let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()?
            }
        };
        Some(Self { target, suffix })
    }

    pub fn format(&self, value: u64) -> String {
        format!("{value}{}", self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterFrame {
    pub value: u64,
    pub text: String,
    pub done: bool,
}

/// Stepwise interpolation from 0 to the target
#[derive(Debug, Clone)]
pub struct CounterAnimation {
    spec: CounterSpec,
    started: Duration,
    step_len: Duration,
    steps: u32,
    last_step: Option<u32>,
    finished: bool,
}

impl CounterAnimation {
    pub fn new(spec: CounterSpec, started: Duration, duration: Duration, steps: u32) -> Self {
        let steps = steps.max(1);
        Self {
            spec,
            started,
            step_len: duration / steps,
            steps,
            last_step: None,
            finished: false,
        }
    }

    /// Frame for `now`, or `None` when nothing changed or the animation is over
    pub fn tick(&mut self, now: Duration) -> Option<CounterFrame> {
        if self.finished {
            return None;
        }

        let elapsed = now.saturating_sub(self.started);
        let step = if self.step_len.is_zero() {
            self.steps
        } else {
            (elapsed.as_nanos() / self.step_len.as_nanos()).min(self.steps as u128) as u32
        };

        if self.last_step == Some(step) {
            return None;
        }
        self.last_step = Some(step);

        let value = self.value_at(step);
        let done = step == self.steps;
        self.finished = done;

        Some(CounterFrame {
            value,
            text: self.spec.format(value),
            done,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_value(&self) -> u64 {
        self.last_step.map(|step| self.value_at(step)).unwrap_or(0)
    }

    fn value_at(&self, step: u32) -> u64 {
        // u128 keeps target * step from overflowing for large targets
        (self.spec.target as u128 * step as u128 / self.steps as u128) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::at_ms;

    #[test]
    fn test_parse_from_text_keeps_suffix() {
        let spec = CounterSpec::parse("500+", None).unwrap();
        assert_eq!(spec.target, 500);
        assert_eq!(spec.suffix, "+");
        assert_eq!(spec.format(42), "42+");
    }

    #[test]
    fn test_parse_prefers_data_target() {
        let spec = CounterSpec::parse("0%", Some("95")).unwrap();
        assert_eq!(spec.target, 95);
        assert_eq!(spec.suffix, "%");
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(CounterSpec::parse("many", None), None);
        assert_eq!(CounterSpec::parse("12", Some("lots")), None);
    }

    #[test]
    fn test_reaches_target_exactly_then_stops() {
        let spec = CounterSpec::parse("354", None).unwrap();
        let mut counter = CounterAnimation::new(spec, at_ms(100), Duration::from_millis(2000), 60);

        let frames: Vec<_> = (100..=2200)
            .step_by(16)
            .filter_map(|now| counter.tick(at_ms(now)))
            .collect();

        assert!(frames.iter().all(|f| f.value <= 354));
        assert_eq!(frames.iter().filter(|f| f.done).count(), 1);

        let last = frames.last().unwrap();
        assert!(last.done);
        assert_eq!(last.value, 354);
        assert_eq!(last.text, "354");
        assert_eq!(counter.current_value(), 354);

        // No further frames after the target
        assert_eq!(counter.tick(at_ms(10_000)), None);
    }

    #[test]
    fn test_values_are_monotonic() {
        let spec = CounterSpec::parse("1000", None).unwrap();
        let mut counter = CounterAnimation::new(spec, at_ms(0), Duration::from_millis(2000), 60);

        let mut previous = 0;
        for now in (0..=2100).step_by(10) {
            if let Some(frame) = counter.tick(at_ms(now)) {
                assert!(frame.value >= previous);
                previous = frame.value;
            }
        }
        assert_eq!(previous, 1000);
    }

    #[test]
    fn test_late_tick_jumps_to_target() {
        let spec = CounterSpec::parse("25+", None).unwrap();
        let mut counter = CounterAnimation::new(spec, at_ms(0), Duration::from_millis(2000), 60);

        let frame = counter.tick(at_ms(9000)).unwrap();
        assert_eq!(frame.text, "25+");
        assert!(frame.done);
    }
}
