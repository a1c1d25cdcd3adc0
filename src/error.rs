use std::io;

use thiserror::Error;

use crate::route::WaypointId;


/**
 * Conditions reported by the tracker. None of these end a tracking session.
 */
#[derive(Debug, Error, PartialEq)]
pub enum TrackerError {
    #[error("route {0:?} has no waypoints")]
    EmptyRoute(String),
    #[error("route {route:?} has more than one waypoint with id {id}")]
    DuplicateWaypoint { route: String, id: WaypointId },
    #[error("no route is being tracked")]
    NotTracking,
    #[error("already at the first waypoint")]
    AtStart,
    #[error("route complete, no waypoint after index {last_index}")]
    RouteComplete { last_index: usize },
    #[error("waypoint index {index} is outside a route of {len} waypoints")]
    OutOfBounds { index: usize, len: usize },
}


impl TrackerError {
    /**
     * True for the expected ends of a route, as opposed to misuse.
     */
    pub fn is_boundary(&self) -> bool {
        match *self {
            TrackerError::AtStart
            | TrackerError::RouteComplete { .. }
            | TrackerError::OutOfBounds { .. } => true,
            _ => false,
        }
    }
}


#[derive(Debug, Error)]
pub enum RouteError {
    #[error("unable to read route file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field} value '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("missing {0} attribute")]
    MissingAttribute(&'static str),
    #[error("unsupported route file type '{0}', expected kml, gpx or json")]
    UnsupportedFormat(String),
}


#[derive(Debug, Error, PartialEq)]
pub enum NmeaError {
    #[error("unsupported sentence type")]
    Unsupported,
    #[error("sentence too short")]
    TooShort,
    #[error("no position fix")]
    NoFix,
    #[error("checksum mismatch, expected {expected:02X}, computed {computed:02X}")]
    Checksum { expected: u8, computed: u8 },
    #[error("invalid field '{0}'")]
    InvalidField(String),
}
