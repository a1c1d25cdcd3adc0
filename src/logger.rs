use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{CombinedLogger, Config, SharedLogger, WriteLogger};

use crate::stdout_logger::StdoutLogger;


/**
 * Installs the global logger: stdout always, plus a log file if one is given.
 */
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<(), String> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![StdoutLogger::new(level)];
    if let Some(path) = log_file {
        let file = match File::create(path) {
            Ok(file) => file,
            Err(e) => return Err(format!("Unable to create log file {}: {}", path.display(), e)),
        };
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    match CombinedLogger::init(loggers) {
        Ok(_) => Ok(()),
        Err(e) => Err(format!("Unable to initialize logger: {}", e)),
    }
}
