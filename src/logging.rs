use std::env;
use std::io::Write;
use std::process;

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};
use syslog::{BasicLogger, Facility, Formatter3164};

/// Installs the process-wide logger: syslog when running under a
/// supervising daemon manager (systemd sets `INVOCATION_ID`), otherwise a
/// formatted line on stderr.
pub fn init(program: &str) -> Result<(), Box<dyn std::error::Error>> {
    if env::var_os("INVOCATION_ID").is_some() {
        let formatter = Formatter3164 {
            facility: Facility::LOG_USER,
            hostname: None,
            process: program.into(),
            pid: process::id(),
        };
        let logger = syslog::unix(formatter)?;
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))?;
    } else {
        log::set_boxed_logger(Box::new(ConsoleLog {
            hostname: hostname(),
            program: program.to_string(),
            pid: process::id(),
        }))?;
    }

    log::set_max_level(LevelFilter::Debug);

    Ok(())
}

fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

fn priority(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug | Level::Trace => "debug",
    }
}

/// Formats records the way syslog prints them on a console:
/// `Mon  d HH:MM:SS host prog[pid]:priority:message`.
struct ConsoleLog {
    hostname: String,
    program: String,
    pid: u32,
}

impl Log for ConsoleLog {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{} {} {}[{}]:{}:{}",
            Local::now().format("%b %e %H:%M:%S"),
            self.hostname,
            self.program,
            self.pid,
            priority(record.level()),
            record.args()
        );
    }

    fn flush(&self) {}
}
