use crate::geodesy::{Coordinate, DistanceResult, Meters, distance_between};
use crate::route::{Destination, Waypoint, WaypointId};


/**
 * A waypoint together with its position in the route and its distance and
 * bearings from a location.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct CalculatedPoint {
    pub waypoint: Waypoint,
    pub index: usize,
    pub result: DistanceResult,
}


#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanResult {
    pub closest: Option<CalculatedPoint>,
    pub target: Option<CalculatedPoint>,
}


#[derive(Clone, Debug, PartialEq)]
pub struct ActiveDestination {
    pub destination: Destination,
    pub index: usize,
    pub result: DistanceResult,
}


/**
 * Measures the distance from the location to every waypoint once, and
 * returns both the closest waypoint and, if it is in the list, the target
 * waypoint. The first waypoint wins ties. Ids are expected to be unique; if
 * they are not, the first waypoint with the target id is the target.
 */
pub fn scan(
    location: &Coordinate,
    waypoints: &[Waypoint],
    target: Option<WaypointId>,
) -> ScanResult {
    let mut closest: Option<(usize, DistanceResult)> = None;
    let mut target_result: Option<(usize, DistanceResult)> = None;

    for (index, waypoint) in waypoints.iter().enumerate() {
        let result = distance_between(location, &waypoint.coordinate);

        if target == Some(waypoint.id) && target_result.is_none() {
            target_result = Some((index, result));
        }

        // Strictly closer only, NaN never wins
        let is_closer = match closest {
            Some((_, best)) => result.distance < best.distance,
            None => true,
        };
        if is_closer {
            closest = Some((index, result));
        }
    }

    let to_point = |(index, result): (usize, DistanceResult)| CalculatedPoint {
        waypoint: waypoints[index].clone(),
        index: index,
        result: result,
    };

    ScanResult {
        closest: closest.map(to_point),
        target: target_result.map(to_point),
    }
}


/**
 * Returns the first destination, in route order, that the location is
 * inside of. The boundary counts as inside. A radius override replaces
 * every destination's own radius.
 */
pub fn find_active_destination(
    location: &Coordinate,
    destinations: &[Destination],
    radius_override: Option<Meters>,
) -> Option<ActiveDestination> {
    for (index, destination) in destinations.iter().enumerate() {
        let result = distance_between(location, &destination.coordinate);
        let radius = radius_override.unwrap_or(destination.radius);
        if result.distance <= radius {
            debug!("Inside {} at {:.2} m", destination, result.distance);
            return Some(ActiveDestination {
                destination: destination.clone(),
                index: index,
                result: result,
            });
        }
    }
    None
}
