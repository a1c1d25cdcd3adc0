use std::fmt;

use crate::geodesy::{Coordinate, Meters, distance_between};


/**
 * Stable identity of a waypoint. Waypoints are matched by id, never by
 * coordinate, so two stops at the same place are still distinct.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointId(pub u64);


impl fmt::Display for WaypointId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}


#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    pub coordinate: Coordinate,
    pub title: Option<String>,
}


impl Waypoint {
    pub fn new(id: u64, latitude: f64, longitude: f64) -> Waypoint {
        Waypoint {
            id: WaypointId(id),
            coordinate: Coordinate::new(latitude, longitude),
            title: None,
        }
    }

}


impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.title {
            Some(ref title) => write!(
                f,
                "{} '{}' ({:.6}, {:.6})",
                self.id,
                title,
                self.coordinate.latitude,
                self.coordinate.longitude),
            None => write!(
                f,
                "{} ({:.6}, {:.6})",
                self.id,
                self.coordinate.latitude,
                self.coordinate.longitude),
        }
    }
}


/**
 * A point of interest along a route, such as a museum or a viewpoint. It is
 * active while the walker is within its own radius.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct Destination {
    pub id: u64,
    pub coordinate: Coordinate,
    pub radius: Meters,
    pub title: Option<String>,
}


impl Destination {
    pub fn new(id: u64, latitude: f64, longitude: f64, radius: Meters) -> Destination {
        Destination {
            id: id,
            coordinate: Coordinate::new(latitude, longitude),
            radius: radius,
            title: None,
        }
    }
}


impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.title {
            Some(ref title) => write!(f, "destination {} '{}'", self.id, title),
            None => write!(f, "destination {}", self.id),
        }
    }
}


/**
 * An ordered list of waypoints. The order is the traversal order. Routes are
 * never edited while they are being tracked, only replaced.
 */
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Route {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub waypoints: Vec<Waypoint>,
    pub destinations: Vec<Destination>,
}


impl Route {
    pub fn new(id: u64, title: &str, waypoints: Vec<Waypoint>) -> Route {
        Route {
            id: id,
            title: title.to_string(),
            description: String::new(),
            waypoints: waypoints,
            destinations: Vec::new(),
        }
    }

    /**
     * Builds a route whose waypoint ids are their positions.
     */
    pub fn from_coordinates(id: u64, title: &str, coordinates: &[Coordinate]) -> Route {
        let waypoints = coordinates
            .iter()
            .enumerate()
            .map(|(index, coordinate)| Waypoint {
                id: WaypointId(index as u64),
                coordinate: *coordinate,
                title: None,
            })
            .collect();
        Route::new(id, title, waypoints)
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    pub fn index_of(&self, id: WaypointId) -> Option<usize> {
        self.waypoints.iter().position(|waypoint| waypoint.id == id)
    }

    /**
     * The first waypoint id that appears more than once, if any.
     */
    pub fn duplicate_id(&self) -> Option<WaypointId> {
        self.waypoints
            .iter()
            .enumerate()
            .find(|&(index, waypoint)| self.index_of(waypoint.id) != Some(index))
            .map(|(_, waypoint)| waypoint.id)
    }

    /**
     * Length of the route when walked waypoint to waypoint.
     */
    pub fn total_distance(&self) -> Meters {
        self.waypoints
            .windows(2)
            .map(|leg| distance_between(&leg[0].coordinate, &leg[1].coordinate).distance)
            .sum()
    }
}
