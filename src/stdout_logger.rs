use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{Config, SharedLogger};


/**
 * Prints log lines as "time file:line LEVEL message".
 */
pub struct StdoutLogger {
    level: LevelFilter,
}


impl StdoutLogger {
    pub fn new(level: LevelFilter) -> Box<StdoutLogger> {
        Box::new(StdoutLogger { level: level })
    }
}


/**
 * Strips the directories and extension from a source path.
 */
fn file_stem(path: Option<&str>) -> &str {
    match path.and_then(|path| path.split('/').last()) {
        Some(name) => match name.split('.').next() {
            Some(stem) => stem,
            None => "UNKNOWN",
        },
        None => "UNKNOWN",
    }
}


pub fn format_record(record: &Record) -> String {
    let time_str = Local::now().format("%Y/%m/%d %H:%M:%S%.3f");
    format!(
        "{time} {file}:{line} {level:<5} {message}",
        time=time_str,
        file=file_stem(record.file()),
        line=record.line().unwrap_or(0),
        level=record.level(),
        message=record.args())
}


impl Log for StdoutLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("{}", format_record(record));
        }
    }

    fn flush(&self) {}
}


impl SharedLogger for StdoutLogger {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}
