//! Boot script configuration

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delay between two boot lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delay {
    /// Always the same number of milliseconds
    Fixed(u64),
    /// Uniformly drawn from `min_ms..=max_ms`
    Random { min_ms: u64, max_ms: u64 },
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Random {
            min_ms: 60,
            max_ms: 220,
        }
    }
}

impl Delay {
    /// Draw a concrete delay
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let ms = match *self {
            Delay::Fixed(ms) => ms,
            Delay::Random { min_ms, max_ms } => {
                let (lo, hi) = if min_ms <= max_ms {
                    (min_ms, max_ms)
                } else {
                    (max_ms, min_ms)
                };
                rng.gen_range(lo..=hi)
            }
        };
        Duration::from_millis(ms)
    }
}

/// One line of the boot script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LineRepr")]
pub struct BootLine {
    pub text: String,
    /// Overrides the script delay for the pause after this line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

/// Lines may be written as plain strings or as `{ text, delay_ms }`
#[derive(Deserialize)]
#[serde(untagged)]
enum LineRepr {
    Text(String),
    Full {
        text: String,
        #[serde(default)]
        delay_ms: Option<u64>,
    },
}

impl From<LineRepr> for BootLine {
    fn from(repr: LineRepr) -> Self {
        match repr {
            LineRepr::Text(text) => BootLine {
                text,
                delay_ms: None,
            },
            LineRepr::Full { text, delay_ms } => BootLine { text, delay_ms },
        }
    }
}

impl BootLine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            delay_ms: None,
        }
    }
}

/// The scripted boot sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootScript {
    pub enabled: bool,
    pub delay: Delay,
    pub lines: Vec<BootLine>,
}

impl Default for BootScript {
    fn default() -> Self {
        let lines = [
            "BIOS v2.4.1 (c) termpress systems",
            "Memory test: 65536K OK",
            "Detecting drives... /dev/posts",
            "Mounting content filesystem... done",
            "Loading kernel modules: markdown syntect tera",
            "Starting blog daemon... [ OK ]",
            "login: guest",
        ];
        Self {
            enabled: true,
            delay: Delay::default(),
            lines: lines.iter().map(|l| BootLine::new(l)).collect(),
        }
    }
}

impl BootScript {
    /// Pause after line `index`
    pub fn delay_for<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Duration {
        match self.lines.get(index).and_then(|l| l.delay_ms) {
            Some(ms) => Duration::from_millis(ms),
            None => self.delay.sample(rng),
        }
    }

    /// JSON suitable for embedding inside a `<script>` element
    pub fn to_embedded_json(&self) -> serde_json::Result<String> {
        Ok(serde_json::to_string(self)?.replace("</", "<\\/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_delay_is_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let delay = Delay::Random {
            min_ms: 40,
            max_ms: 90,
        };
        for _ in 0..200 {
            let d = delay.sample(&mut rng);
            assert!(d >= Duration::from_millis(40) && d <= Duration::from_millis(90));
        }

        // Reversed bounds are tolerated
        let reversed = Delay::Random {
            min_ms: 90,
            max_ms: 40,
        };
        let d = reversed.sample(&mut rng);
        assert!(d >= Duration::from_millis(40) && d <= Duration::from_millis(90));
    }

    #[test]
    fn test_line_override() {
        let mut rng = StdRng::seed_from_u64(1);
        let script = BootScript {
            enabled: true,
            delay: Delay::Fixed(100),
            lines: vec![
                BootLine::new("a"),
                BootLine {
                    text: "b".to_string(),
                    delay_ms: Some(5),
                },
            ],
        };
        assert_eq!(script.delay_for(0, &mut rng), Duration::from_millis(100));
        assert_eq!(script.delay_for(1, &mut rng), Duration::from_millis(5));
    }

    #[test]
    fn test_deserialize_line_forms() {
        let yaml = "delay: 50\nlines:\n  - plain line\n  - text: timed\n    delay_ms: 900\n";
        let script: BootScript = serde_yaml::from_str(yaml).unwrap();
        assert!(script.enabled);
        assert_eq!(script.delay, Delay::Fixed(50));
        assert_eq!(script.lines[0], BootLine::new("plain line"));
        assert_eq!(script.lines[1].delay_ms, Some(900));
    }

    #[test]
    fn test_embedded_json_escapes_script_close() {
        let script = BootScript {
            enabled: true,
            delay: Delay::Fixed(1),
            lines: vec![BootLine::new("</script><b>")],
        };
        let json = script.to_embedded_json().unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains(r#""delay":1"#));
    }
}
