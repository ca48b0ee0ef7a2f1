//! Console formatter.
//!
//! # Responsibilities
//! - Render one record as a level tag line, an indented message line and an
//!   optional exception block
//! - Colour each part by level (ANSI, via `colored`)
//! - Write to stdout, or to an in-memory buffer when output is captured
//!
//! Layout:
//! ```text
//! INF: 2024-05-01 10:00:00.123 | app::orders[1001]
//!      trace-1(request): GET /orders => {}
//! ERR: 2024-05-01 10:00:00.130 | app::orders[0]
//!      failed to load order
//!      ErrorMessage: connection refused
//!      Type: std::io::Error
//!      Source: std
//!      StackTrace:
//!       <trace>
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use colored::{Color, Colorize};

use crate::record::{EventId, ExceptionInfo, LogLevel, LogRecord, MIDDLEWARE_EVENT};

/// Indentation for message and exception lines.
pub const MARGIN: &str = "     ";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Foreground/background pair; `None` keeps the terminal default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Paint {
    fg: Option<Color>,
    bg: Option<Color>,
}

impl Paint {
    const PLAIN: Paint = Paint { fg: None, bg: None };

    const fn fg(color: Color) -> Self {
        Paint {
            fg: Some(color),
            bg: None,
        }
    }

    const fn on(fg: Color, bg: Color) -> Self {
        Paint {
            fg: Some(fg),
            bg: Some(bg),
        }
    }

    fn apply(self, text: &str, enabled: bool) -> String {
        if !enabled || self == Paint::PLAIN {
            return text.to_string();
        }
        let mut painted = text.normal();
        if let Some(fg) = self.fg {
            painted = painted.color(fg);
        }
        if let Some(bg) = self.bg {
            painted = painted.on_color(bg);
        }
        painted.to_string()
    }
}

/// Colours used for one line group.
#[derive(Debug, Clone, Copy, Default)]
struct Palette {
    level: Paint,
    message: Paint,
    error: Paint,
}

impl Palette {
    fn for_level(level: LogLevel, event_id: &EventId) -> Self {
        match level {
            LogLevel::Trace => Palette {
                level: Paint::fg(Color::Cyan),
                ..Default::default()
            },
            LogLevel::Debug => Palette {
                level: Paint::fg(Color::White),
                message: Paint::fg(Color::BrightBlack),
                ..Default::default()
            },
            LogLevel::Info => Palette {
                level: Paint::fg(Color::Green),
                message: if *event_id == MIDDLEWARE_EVENT {
                    Paint::fg(Color::BrightWhite)
                } else {
                    Paint::PLAIN
                },
                ..Default::default()
            },
            LogLevel::Warn => Palette {
                level: Paint::fg(Color::Yellow),
                message: Paint::fg(Color::BrightWhite),
                ..Default::default()
            },
            LogLevel::Error => Palette {
                level: Paint::fg(Color::Red),
                message: Paint::fg(Color::BrightYellow),
                error: Paint::fg(Color::BrightYellow),
            },
            LogLevel::Critical => Palette {
                level: Paint::on(Color::BrightYellow, Color::Red),
                message: Paint::on(Color::Red, Color::BrightYellow),
                error: Paint::fg(Color::Red),
            },
            LogLevel::None => Palette::default(),
        }
    }
}

/// Everything the formatter needs for one block.
#[derive(Debug, Clone)]
pub struct TerminalEntry<'a> {
    pub category: &'a str,
    pub level: LogLevel,
    pub event_id: &'a EventId,
    pub message: &'a str,
    /// `None` prints the category line without a timestamp.
    pub timestamp: Option<DateTime<Local>>,
    pub exception: Option<&'a ExceptionInfo>,
}

#[derive(Debug, Clone)]
enum Output {
    Stdout,
    Buffer(Arc<Mutex<Vec<u8>>>),
}

/// Console writer shared by the console sink and the dispatch workers.
#[derive(Debug, Clone)]
pub struct Terminal {
    colored: bool,
    output: Output,
}

impl Default for Terminal {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Terminal {
    /// Coloured output to the process stdout.
    pub fn stdout() -> Self {
        Self {
            colored: true,
            output: Output::Stdout,
        }
    }

    /// Uncoloured output collected in memory; read it with [`Terminal::contents`].
    pub fn captured() -> Self {
        Self {
            colored: false,
            output: Output::Buffer(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Everything written so far when output is captured; empty for stdout.
    pub fn contents(&self) -> String {
        match &self.output {
            Output::Stdout => String::new(),
            Output::Buffer(buffer) => {
                let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                String::from_utf8_lossy(&bytes).into_owned()
            }
        }
    }

    /// Render one block. A `None` level renders nothing.
    pub fn render(&self, entry: &TerminalEntry<'_>) -> String {
        if entry.level == LogLevel::None {
            return String::new();
        }
        let palette = Palette::for_level(entry.level, entry.event_id);
        let colored = self.colored;
        let mut out = String::new();

        out.push_str(&palette.level.apply(entry.level.tag(), colored));
        out.push_str(": ");

        let date = entry
            .timestamp
            .map(|ts| format!("{} | ", ts.format(DATE_FORMAT)))
            .unwrap_or_default();
        let header = format!("{}{}[{}]", date, entry.category, entry.event_id.id);
        let header_paint = match entry.level {
            LogLevel::Error | LogLevel::Critical => palette.message,
            _ => Paint::PLAIN,
        };
        out.push_str(&header_paint.apply(&header, colored));
        out.push('\n');

        out.push_str(MARGIN);
        out.push_str(&palette.message.apply(entry.message, colored));
        out.push('\n');

        if let Some(exception) = entry.exception {
            let lines = [
                format!("ErrorMessage: {}", exception.message()),
                format!("Type: {}", exception.kind()),
                format!("Source: {}", exception.source()),
                "StackTrace:".to_string(),
                format!(" {}", exception.stack_trace().trim()),
            ];
            for line in &lines {
                out.push_str(MARGIN);
                out.push_str(&palette.error.apply(line, colored));
                out.push('\n');
            }
        }
        out
    }

    /// Print a record, with or without its timestamp.
    pub fn print_record(&self, record: &LogRecord, print_date: bool) {
        let entry = TerminalEntry {
            category: record.category(),
            level: record.level(),
            event_id: record.event_id(),
            message: record.text(),
            timestamp: print_date.then(|| record.timestamp().with_timezone(&Local)),
            exception: record.exception(),
        };
        self.write(&self.render(&entry));
    }

    /// Print a message that did not go through the pipeline, such as a sink
    /// failure.
    pub fn report(&self, category: &str, level: LogLevel, message: &str, exception: Option<&ExceptionInfo>) {
        let event_id = EventId::default();
        let entry = TerminalEntry {
            category,
            level,
            event_id: &event_id,
            message,
            timestamp: Some(Local::now()),
            exception,
        };
        self.write(&self.render(&entry));
    }

    fn write(&self, block: &str) {
        if block.is_empty() {
            return;
        }
        match &self.output {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(block.as_bytes()).and_then(|_| stdout.flush()) {
                    tracing::debug!(error = %e, "Console write failed");
                }
            }
            Output::Buffer(buffer) => {
                buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend_from_slice(block.as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry<'a>(level: LogLevel, event_id: &'a EventId, exception: Option<&'a ExceptionInfo>) -> TerminalEntry<'a> {
        TerminalEntry {
            category: "app::orders",
            level,
            event_id,
            message: "order created",
            timestamp: Some(Local.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()),
            exception,
        }
    }

    #[test]
    fn test_info_layout() {
        let terminal = Terminal::captured();
        let event_id = EventId::new(7);
        let rendered = terminal.render(&entry(LogLevel::Info, &event_id, None));
        assert_eq!(
            rendered,
            "INF: 2024-05-01 10:00:00.000 | app::orders[7]\n     order created\n"
        );
    }

    #[test]
    fn test_no_date_for_lifecycle_lines() {
        let terminal = Terminal::captured();
        let event_id = EventId::default();
        let mut e = entry(LogLevel::Warn, &event_id, None);
        e.timestamp = None;
        assert!(terminal.render(&e).starts_with("WRN: app::orders[0]\n"));
    }

    #[test]
    fn test_exception_block() {
        let terminal = Terminal::captured();
        let event_id = EventId::default();
        let exception = ExceptionInfo::new("std::io::Error", "refused").with_stack_trace("  at main\n");
        let rendered = terminal.render(&entry(LogLevel::Critical, &event_id, Some(&exception)));
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].starts_with("CRITICAL: "));
        assert_eq!(lines[2], "     ErrorMessage: refused");
        assert_eq!(lines[3], "     Type: std::io::Error");
        assert_eq!(lines[5], "     StackTrace:");
        assert_eq!(lines[6], "      at main");
    }

    #[test]
    fn test_none_level_renders_nothing() {
        let terminal = Terminal::captured();
        let event_id = EventId::default();
        assert!(terminal.render(&entry(LogLevel::None, &event_id, None)).is_empty());
    }

    #[test]
    fn test_captured_output_accumulates() {
        let terminal = Terminal::captured();
        terminal.report("sink", LogLevel::Error, "first", None);
        terminal.report("sink", LogLevel::Error, "second", None);
        let contents = terminal.contents();
        assert!(contents.contains("     first\n"));
        assert!(contents.contains("     second\n"));
        assert!(contents.contains("ERR: "));
    }

    #[test]
    fn test_colored_output_wraps_tag() {
        colored::control::set_override(true);
        let terminal = Terminal::captured().with_colors(true);
        let event_id = EventId::default();
        let rendered = terminal.render(&entry(LogLevel::Error, &event_id, None));
        assert!(rendered.starts_with("\u{1b}["));
        assert!(rendered.contains("ERR"));
    }
}
