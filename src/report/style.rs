// src/report/style.rs
use crate::health::Category;

/// Terminal colours used by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Yellow,
    Cyan,
    Green,
    Red,
    Orange,
    Magenta,
}

impl Color {
    fn ansi(self) -> &'static str {
        match self {
            Color::Yellow => "\x1b[33m",
            Color::Cyan => "\x1b[36m",
            Color::Green => "\x1b[32m",
            Color::Red => "\x1b[31m",
            Color::Orange => "\x1b[38;5;208m",
            Color::Magenta => "\x1b[35m",
        }
    }

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Healthy => Color::Green,
            Category::Unhealthy => Color::Red,
            Category::Neutral => Color::Orange,
            Category::Unreachable => Color::Magenta,
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Wraps text in colour escapes, or leaves it alone when colour is off.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn paint(&self, color: Color, text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", color.ansi(), text, RESET)
        } else {
            text.to_string()
        }
    }
}
