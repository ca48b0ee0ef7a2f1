//! Console sink.

use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::record::{LogLevel, LogRecord};
use crate::sinks::terminal::Terminal;
use crate::sinks::{Sink, SinkError};

pub struct ConsoleSink {
    config: ArcSwap<ConsoleConfig>,
    terminal: Terminal,
}

impl ConsoleSink {
    pub fn new(config: ConsoleConfig, terminal: Terminal) -> Self {
        let terminal = terminal.with_colors(config.colored);
        Self {
            config: ArcSwap::from_pointee(config),
            terminal,
        }
    }

    /// Swap settings; the next dispatch uses them.
    pub fn apply(&self, config: ConsoleConfig) {
        self.config.store(Arc::new(config));
    }

    pub fn config(&self) -> Arc<ConsoleConfig> {
        self.config.load_full()
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &'static str {
        module_path!()
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        let config = self.config.load();
        config.enabled && level.passes(config.min_level)
    }

    fn ignores(&self, category: &str) -> bool {
        self.config.load().ignore_categories.iter().any(|c| c == category)
    }

    async fn dispatch(&self, record: &LogRecord) -> Result<(), SinkError> {
        let config = self.config.load();
        let print_date = record.category() != config.lifecycle_category;
        self.terminal
            .clone()
            .with_colors(config.colored)
            .print_record(record, print_date);
        Ok(())
    }
}
