//! ANSI decoration for `davtool` output.
//!
//! Whether the terminal takes escape codes is decided once via
//! [`ColorSupport::detect`]; every formatter is then a pure function of its
//! text and that flag.

pub const RED: &str = "\x1b[91m";
pub const GREEN: &str = "\x1b[32m";
pub const CYAN: &str = "\x1b[36m";
pub const YELLOW: &str = "\x1b[33m";
pub const GRAY: &str = "\x1b[90m";
pub const BOLD: &str = "\x1b[1m";
pub const PURPLE_UNDERLINE: &str = "\x1b[35;4m";
pub const DEFAULT_STYLE: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSupport {
    Enabled,
    Disabled,
}

impl ColorSupport {
    /// Escape codes are emitted only when `TERM` is set to something non-empty.
    pub fn detect() -> Self {
        Self::from_term(std::env::var_os("TERM").as_deref().and_then(|t| t.to_str()))
    }

    pub fn from_term(term: Option<&str>) -> Self {
        match term {
            Some(t) if !t.is_empty() => ColorSupport::Enabled,
            _ => ColorSupport::Disabled,
        }
    }

    pub fn colorize(self, code: &str, text: &str) -> String {
        if self == ColorSupport::Disabled || text.trim().is_empty() {
            return text.to_string();
        }
        format!("{code}{text}{DEFAULT_STYLE}")
    }

    pub fn red(self, text: &str) -> String {
        self.colorize(RED, text)
    }

    pub fn green(self, text: &str) -> String {
        self.colorize(GREEN, text)
    }

    pub fn cyan(self, text: &str) -> String {
        self.colorize(CYAN, text)
    }

    pub fn yellow(self, text: &str) -> String {
        self.colorize(YELLOW, text)
    }

    pub fn gray(self, text: &str) -> String {
        self.colorize(GRAY, text)
    }

    pub fn bold(self, text: &str) -> String {
        self.colorize(BOLD, text)
    }

    pub fn purple_underline(self, text: &str) -> String {
        self.colorize(PURPLE_UNDERLINE, text)
    }

    pub fn no_color(self, text: &str) -> String {
        self.colorize(DEFAULT_STYLE, text)
    }
}
