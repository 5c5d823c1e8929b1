#[cfg(feature = "cli")]
use crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor};
#[cfg(feature = "cli")]
use std::fmt::Write;

pub const DEBUG_ENV: &str = "SCRIBEPACK_DEBUG";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Success,
    Error,
    Info,
    Warning,
    Debug,
}

#[derive(Debug, Clone, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Logger
    }

    fn enabled(level: LogLevel) -> bool {
        level != LogLevel::Debug || std::env::var_os(DEBUG_ENV).is_some()
    }

    #[cfg(feature = "cli")]
    pub fn log_message(&self, level: LogLevel, message: &str) {
        if !Self::enabled(level) {
            return;
        }
        let line = format!("📦 {} {} {}", self.signature(), self.format_status(level), message);
        // Errors and warnings go to stderr so piped listings stay clean.
        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    #[cfg(not(feature = "cli"))]
    pub fn log_message(&self, _level: LogLevel, _message: &str) {}

    #[cfg(feature = "cli")]
    pub fn log_message_with_trace(&self, level: LogLevel, message: &str, trace: Vec<&str>) {
        if !Self::enabled(level) {
            return;
        }
        self.log_message(level, message);
        for t in trace {
            println!("     ↳ {}", t);
        }
    }

    #[cfg(not(feature = "cli"))]
    pub fn log_message_with_trace(&self, _level: LogLevel, _message: &str, _trace: Vec<&str>) {}

    pub fn success(&self, message: &str) {
        self.log_message(LogLevel::Success, message);
    }

    pub fn info(&self, message: &str) {
        self.log_message(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log_message(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log_message(LogLevel::Error, message);
    }

    pub fn debug(&self, message: &str) {
        self.log_message(LogLevel::Debug, message);
    }

    #[cfg(feature = "cli")]
    fn signature(&self) -> String {
        let mut s = String::new();

        let _ = write!(&mut s, "{}", SetForegroundColor(Color::Grey));
        s.push('[');
        let _ = write!(
            &mut s,
            "{}",
            SetForegroundColor(Color::Rgb {
                r: 240,
                g: 128,
                b: 48,
            })
        );
        let _ = write!(&mut s, "{}", SetAttribute(Attribute::Bold));
        s.push_str("Scribepack");
        let _ = write!(&mut s, "{}", SetAttribute(Attribute::Reset));
        let _ = write!(&mut s, "{}", SetForegroundColor(Color::Grey));
        s.push(']');
        let _ = write!(&mut s, "{}", ResetColor);

        s
    }

    #[cfg(feature = "cli")]
    fn format_status(&self, level: LogLevel) -> String {
        let mut s = String::new();

        let color = match level {
            LogLevel::Success => Color::Rgb {
                r: 76,
                g: 175,
                b: 80,
            },
            LogLevel::Error => Color::Rgb {
                r: 244,
                g: 67,
                b: 54,
            },
            LogLevel::Info => Color::Rgb {
                r: 33,
                g: 150,
                b: 243,
            },
            LogLevel::Warning => Color::Rgb {
                r: 255,
                g: 152,
                b: 0,
            },
            LogLevel::Debug => Color::Rgb {
                r: 103,
                g: 58,
                b: 183,
            },
        };

        s.push('[');
        let _ = write!(&mut s, "{}", SetForegroundColor(color));
        let _ = write!(&mut s, "{}", SetAttribute(Attribute::Bold));
        s.push_str(level_label(level));
        let _ = write!(&mut s, "{}", SetAttribute(Attribute::Reset));
        s.push(']');
        let _ = write!(&mut s, "{}", ResetColor);

        s
    }
}

fn level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Success => "SUCCESS",
        LogLevel::Error => "ERROR",
        LogLevel::Info => "INFO",
        LogLevel::Warning => "WARNING",
        LogLevel::Debug => "DEBUG",
    }
}
