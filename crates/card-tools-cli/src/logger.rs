use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};

/// Writes log records to stderr with a timestamp
pub struct CliLogger {
    level: LevelFilter,
}

impl CliLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// Pick a level from the `-v` count, or errors only when quiet
    pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
        if quiet {
            return LevelFilter::Error;
        }
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }
}

impl log::Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        };
        eprintln!(
            "{} {:>5} [{}] {}",
            Local::now().format("%H:%M:%S%.3f"),
            tag,
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}
