use std::path::PathBuf;

use getopts::{Matches, Options};
use log::LevelFilter;

use crate::geodesy::Meters;

pub type MilliSeconds = u64;

/// Distance at which a target waypoint counts as reached.
pub const ARRIVAL_RADIUS_M: Meters = 15.0;
pub const DEFAULT_POLL_INTERVAL_MS: MilliSeconds = 10_000;


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    pub arrival_radius: Meters,
    /// Recompute the target distance from the last location whenever the
    /// target changes, instead of waiting for the next fix.
    pub refresh_on_target_change: bool,
    /// Replaces the radius of every destination when set.
    pub destination_radius: Option<Meters>,
}


impl Default for TrackerConfig {
    fn default() -> TrackerConfig {
        TrackerConfig {
            arrival_radius: ARRIVAL_RADIUS_M,
            refresh_on_target_change: true,
            destination_radius: None,
        }
    }
}


/**
 * Settings for the command line tracker.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub tracker: TrackerConfig,
    pub poll_interval_ms: MilliSeconds,
    pub route_file: Option<PathBuf>,
    pub fixes_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub log_level: LevelFilter,
}


impl Default for Config {
    fn default() -> Config {
        Config {
            tracker: TrackerConfig::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            route_file: None,
            fixes_file: None,
            log_file: None,
            log_level: LevelFilter::Info,
        }
    }
}


pub fn options() -> Options {
    let mut opts = Options::new();
    opts.optflag("v", "verbose", "Prints extra logging.");
    opts.optflag("h", "help", "Print this help menu.");
    opts.optopt("r", "route", "Route to start tracking (kml, gpx or json).", "FILE");
    opts.optopt("f", "fixes", "Read fixes and commands from FILE instead of stdin.", "FILE");
    opts.optopt(
        "i",
        "interval",
        &format!("Minimum time between location fixes, 0 to disable (default {}).", DEFAULT_POLL_INTERVAL_MS),
        "MS");
    opts.optopt(
        "a",
        "arrival-radius",
        &format!("Distance to count a waypoint as reached (default {}).", ARRIVAL_RADIUS_M),
        "METERS");
    opts.optopt(
        "d",
        "destination-radius",
        "Use this radius for every destination instead of their own.",
        "METERS");
    opts.optopt("l", "log-file", "Also write the log to FILE.", "FILE");
    opts
}


impl Config {
    /**
     * Builds the configuration from parsed command line options.
     */
    pub fn from_matches(matches: &Matches) -> Result<Config, String> {
        let mut config = Config::default();

        if matches.opt_present("v") {
            config.log_level = LevelFilter::Debug;
        }
        config.route_file = matches.opt_str("r").map(PathBuf::from);
        config.fixes_file = matches.opt_str("f").map(PathBuf::from);
        config.log_file = matches.opt_str("l").map(PathBuf::from);

        if let Some(interval) = matches.opt_str("i") {
            config.poll_interval_ms = match interval.parse::<MilliSeconds>() {
                Ok(ms) => ms,
                Err(e) => return Err(format!("Invalid interval '{}': {}", interval, e)),
            };
        }

        if let Some(radius) = matches.opt_str("a") {
            config.tracker.arrival_radius = match radius.parse::<Meters>() {
                Ok(m) if m.is_finite() && m >= 0.0 => m,
                Ok(m) => return Err(format!("Invalid arrival radius {}", m)),
                Err(e) => return Err(format!("Invalid arrival radius '{}': {}", radius, e)),
            };
        }

        if let Some(radius) = matches.opt_str("d") {
            config.tracker.destination_radius = match radius.parse::<Meters>() {
                Ok(m) if m.is_finite() && m >= 0.0 => Some(m),
                Ok(m) => return Err(format!("Invalid destination radius {}", m)),
                Err(e) => return Err(format!("Invalid destination radius '{}': {}", radius, e)),
            };
        }

        Ok(config)
    }
}
