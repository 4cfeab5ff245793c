use cfg_if::cfg_if;
use log::{Level, LevelFilter, Log, Metadata, Record};
use worker::{console_debug, console_error, console_log, console_warn};

cfg_if! {
    // https://github.com/rustwasm/console_error_panic_hook#readme
    if #[cfg(feature = "console_error_panic_hook")] {
        pub use console_error_panic_hook::set_once as set_panic_hook;
    } else {
        #[inline]
        pub fn set_panic_hook() {}
    }
}

/// Routes `log` records to the Workers console.
struct ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        match record.level() {
            Level::Error => {
                console_error!("[{}] {}", record.target(), record.args());
            }
            Level::Warn => {
                console_warn!("[{}] {}", record.target(), record.args());
            }
            Level::Info => {
                console_log!("[{}] {}", record.target(), record.args());
            }
            Level::Debug | Level::Trace => {
                console_debug!("[{}] {}", record.target(), record.args());
            }
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Installs the console logger once per isolate; later calls only adjust the level.
pub fn init_logger(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
