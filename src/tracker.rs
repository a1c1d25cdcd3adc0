use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::geodesy::{Coordinate, distance_between};
use crate::proximity::{CalculatedPoint, ScanResult, find_active_destination, scan};
use crate::route::{Route, Waypoint};
use crate::tracker_message::{Command, TrackerEvent, TrackerObserver};


#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrackerStatus {
    Idle,
    Tracking,
}


/**
 * Follows an agent along a route. Every location fix finds the closest
 * waypoint and the distance to the target waypoint, and the target moves on
 * once the agent is within the arrival radius of it.
 *
 * A tracker has a single owner; every method that changes state takes
 * `&mut self`, so callers on several threads need to funnel through one
 * owner (see `TrackerService`).
 */
pub struct Tracker {
    config: TrackerConfig,
    route: Option<Route>,
    target_index: Option<usize>,
    last_location: Option<Coordinate>,
    last_closest: Option<CalculatedPoint>,
    last_target_distance: Option<CalculatedPoint>,
    active_destination: Option<u64>,
    completed: bool,
    observers: Vec<Box<dyn TrackerObserver + Send>>,
}


impl Tracker {
    pub fn new(config: TrackerConfig) -> Tracker {
        Tracker {
            config: config,
            route: None,
            target_index: None,
            last_location: None,
            last_closest: None,
            last_target_distance: None,
            active_destination: None,
            completed: false,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn TrackerObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn status(&self) -> TrackerStatus {
        match (&self.route, self.target_index) {
            (Some(_), Some(_)) => TrackerStatus::Tracking,
            _ => TrackerStatus::Idle,
        }
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn target_index(&self) -> Option<usize> {
        self.target_index
    }

    pub fn target(&self) -> Option<&Waypoint> {
        match (&self.route, self.target_index) {
            (Some(route), Some(index)) => route.get(index),
            _ => None,
        }
    }

    pub fn last_location(&self) -> Option<Coordinate> {
        self.last_location
    }

    pub fn last_closest(&self) -> Option<&CalculatedPoint> {
        self.last_closest.as_ref()
    }

    pub fn last_target_distance(&self) -> Option<&CalculatedPoint> {
        self.last_target_distance.as_ref()
    }

    /**
     * Id of the destination the last fix was inside of.
     */
    pub fn active_destination(&self) -> Option<u64> {
        self.active_destination
    }

    /**
     * Starts tracking a route from its first waypoint. The last known
     * location survives the switch. An empty route leaves the tracker idle.
     */
    pub fn activate_route(&mut self, route: Route) -> Result<(), TrackerError> {
        self.route = None;
        self.target_index = None;
        self.last_closest = None;
        self.last_target_distance = None;
        self.active_destination = None;
        self.completed = false;

        if route.is_empty() {
            warn!("Not activating route '{}', it has no waypoints", route.title);
            return Err(TrackerError::EmptyRoute(route.title));
        }
        if let Some(id) = route.duplicate_id() {
            warn!("Not activating route '{}', waypoint id {} is not unique", route.title, id);
            return Err(TrackerError::DuplicateWaypoint {
                route: route.title,
                id: id,
            });
        }

        info!(
            "Activating route '{}' with {} waypoints, {:.0} m long",
            route.title,
            route.len(),
            route.total_distance());
        self.route = Some(route);
        self.set_target(0);
        Ok(())
    }

    /**
     * Stops tracking and forgets everything, including the last location.
     */
    pub fn deactivate(&mut self) {
        info!("Deactivating route");
        self.route = None;
        self.target_index = None;
        self.last_location = None;
        self.last_closest = None;
        self.last_target_distance = None;
        self.active_destination = None;
        self.completed = false;
    }

    /**
     * Handles a new location fix. Does nothing and returns None while idle.
     */
    pub fn on_location(&mut self, location: Coordinate) -> Option<ScanResult> {
        let result = {
            let route = match self.route {
                Some(ref route) => route,
                None => {
                    debug!("Ignoring fix {:?}, no active route", location);
                    return None;
                }
            };
            let target_id = self.target_index
                .and_then(|index| route.get(index))
                .map(|waypoint| waypoint.id);
            scan(&location, &route.waypoints, target_id)
        };
        debug!("Fix {:?}: {:?}", location, result);

        self.last_location = Some(location);
        self.last_closest = result.closest.clone();
        self.last_target_distance = result.target.clone();

        match result.closest {
            Some(ref closest) => self.emit(TrackerEvent::ClosestWaypointUpdated(closest.clone())),
            None => warn!("No closest waypoint for fix {:?}", location),
        }
        self.update_destination(&location);
        if let Some(ref target) = result.target {
            self.emit(TrackerEvent::TargetDistanceUpdated(target.clone()));
            if target.result.distance < self.config.arrival_radius {
                self.arrive(target);
            }
        }

        Some(result)
    }

    /**
     * Moves the target by step waypoints, which can be negative.
     * Returns the new target index.
     */
    pub fn advance(&mut self, step: isize) -> Result<usize, TrackerError> {
        let (current, len) = match (&self.route, self.target_index) {
            (Some(route), Some(index)) => (index, route.len()),
            _ => return Err(TrackerError::NotTracking),
        };
        let next = current as isize + step;
        debug!("Moving target by {}, {} -> {} of {}", step, current, next, len);

        if next < 0 {
            warn!("Unable to move target to {}, already at the start", next);
            return Err(TrackerError::AtStart);
        }
        if next as usize >= len {
            info!("Unable to move target to {}, route has {} waypoints", next, len);
            return Err(TrackerError::RouteComplete { last_index: len - 1 });
        }

        let next = next as usize;
        self.set_target(next);
        Ok(next)
    }

    pub fn next_waypoint(&mut self) -> Result<usize, TrackerError> {
        self.advance(1)
    }

    pub fn previous_waypoint(&mut self) -> Result<usize, TrackerError> {
        self.advance(-1)
    }

    /**
     * Makes the waypoint at index the target.
     */
    pub fn select_waypoint(&mut self, index: usize) -> Result<usize, TrackerError> {
        let (current, len) = match (&self.route, self.target_index) {
            (Some(route), Some(current)) => (current, route.len()),
            _ => return Err(TrackerError::NotTracking),
        };
        if index >= len {
            warn!("Unable to select waypoint {}, route has {} waypoints", index, len);
            return Err(TrackerError::OutOfBounds { index: index, len: len });
        }
        self.advance(index as isize - current as isize)
    }

    /**
     * Recomputes the distance to the target from the last known location
     * without waiting for a new fix. Arrival is not checked. Returns false
     * if there is no location or no target.
     */
    pub fn recompute_target_distance(&mut self) -> bool {
        let point = match (self.last_location, self.target_index, &self.route) {
            (Some(location), Some(index), Some(route)) => match route.get(index) {
                Some(waypoint) => CalculatedPoint {
                    waypoint: waypoint.clone(),
                    index: index,
                    result: distance_between(&location, &waypoint.coordinate),
                },
                None => return false,
            },
            _ => return false,
        };

        self.last_target_distance = Some(point.clone());
        self.emit(TrackerEvent::TargetDistanceUpdated(point));
        true
    }

    /**
     * Applies a user command. Starting the route that is already being
     * tracked and stopping while idle do nothing.
     */
    pub fn handle(&mut self, command: Command) -> Result<(), TrackerError> {
        match command {
            Command::Start(route) => {
                if self.status() == TrackerStatus::Tracking && self.route.as_ref() == Some(&route) {
                    debug!("Already tracking route '{}'", route.title);
                    return Ok(());
                }
                self.activate_route(route)
            },
            Command::Stop => {
                if self.status() == TrackerStatus::Idle {
                    debug!("Already stopped");
                    return Ok(());
                }
                self.deactivate();
                Ok(())
            },
            Command::NextWaypoint => self.next_waypoint().map(|_| ()),
            Command::PreviousWaypoint => self.previous_waypoint().map(|_| ()),
            Command::SelectWaypoint(index) => self.select_waypoint(index).map(|_| ()),
        }
    }

    fn arrive(&mut self, target: &CalculatedPoint) {
        info!(
            "Reached waypoint {} at index {}, {:.2} m away",
            target.waypoint,
            target.index,
            target.result.distance);
        match self.advance(1) {
            Ok(_) => (),
            Err(TrackerError::RouteComplete { .. }) => {
                if !self.completed {
                    self.completed = true;
                    info!("Route complete");
                    self.emit(TrackerEvent::RouteCompleted {
                        waypoint: target.waypoint.clone(),
                        index: target.index,
                    });
                }
            },
            Err(e) => error!("Unable to advance after arrival: {}", e),
        }
    }

    /**
     * The index must be in bounds of the active route.
     */
    fn set_target(&mut self, index: usize) {
        let waypoint = match self.route.as_ref().and_then(|route| route.get(index)) {
            Some(waypoint) => waypoint.clone(),
            None => {
                error!("Target index {} is out of bounds", index);
                return;
            }
        };
        info!("Target is now waypoint {} at index {}", waypoint, index);
        self.target_index = Some(index);
        self.last_target_distance = None;
        self.completed = false;
        self.emit(TrackerEvent::TargetChanged {
            waypoint: waypoint,
            index: index,
        });

        if self.config.refresh_on_target_change {
            self.recompute_target_distance();
        }
    }

    fn update_destination(&mut self, location: &Coordinate) {
        let active = match self.route {
            Some(ref route) => find_active_destination(
                location,
                &route.destinations,
                self.config.destination_radius),
            None => None,
        };
        let active_id = active.as_ref().map(|active| active.destination.id);
        let previous = self.active_destination;
        if active_id == previous {
            return;
        }
        self.active_destination = active_id;
        if let Some(id) = previous {
            info!("Left destination {}", id);
            self.emit(TrackerEvent::DestinationLeft { id: id });
        }
        if let Some(active) = active {
            info!("Entered {}, {:.2} m away", active.destination, active.result.distance);
            self.emit(TrackerEvent::DestinationEntered(active));
        }
    }

    fn emit(&mut self, event: TrackerEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event);
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::mpsc::{Receiver, channel};

    use crate::config::TrackerConfig;
    use crate::error::TrackerError;
    use crate::geodesy::{Coordinate, distance_between};
    use crate::route::{Destination, Route, Waypoint, WaypointId};
    use crate::route_loader::parse_json;
    use crate::tracker_message::{Command, TrackerEvent};
    use super::{Tracker, TrackerStatus};

    fn line() -> Route {
        Route::new(
            1,
            "Line",
            vec![
                Waypoint::new(0, 0.0, 0.0),
                Waypoint::new(1, 0.0, 0.001),
                Waypoint::new(2, 0.0, 0.002),
            ])
    }

    fn tracker(config: TrackerConfig) -> (Tracker, Receiver<TrackerEvent>) {
        let (event_tx, event_rx) = channel();
        let mut tracker = Tracker::new(config);
        tracker.subscribe(Box::new(event_tx));
        (tracker, event_rx)
    }

    fn quiet_tracker() -> (Tracker, Receiver<TrackerEvent>) {
        tracker(TrackerConfig {
            refresh_on_target_change: false,
            ..TrackerConfig::default()
        })
    }

    fn drain(event_rx: &Receiver<TrackerEvent>) -> Vec<TrackerEvent> {
        event_rx.try_iter().collect()
    }

    fn target_changes(events: &[TrackerEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|event| match *event {
                TrackerEvent::TargetChanged { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_idle() {
        let (mut tracker, event_rx) = quiet_tracker();
        assert!(tracker.status() == TrackerStatus::Idle);
        assert!(tracker.on_location(Coordinate::new(0.0, 0.0)).is_none());
        assert!(tracker.last_location().is_none());
        assert!(tracker.advance(1) == Err(TrackerError::NotTracking));
        assert!(tracker.select_waypoint(0) == Err(TrackerError::NotTracking));
        assert!(!tracker.recompute_target_distance());
        assert!(drain(&event_rx).is_empty());
    }

    #[test]
    fn test_activate() {
        let (mut tracker, event_rx) = quiet_tracker();
        assert!(tracker.activate_route(line()).is_ok());
        assert!(tracker.status() == TrackerStatus::Tracking);
        assert!(tracker.target_index() == Some(0));
        assert!(tracker.target().map(|w| w.id) == Some(WaypointId(0)));
        assert!(target_changes(&drain(&event_rx)) == vec![0]);
    }

    #[test]
    fn test_activate_empty_route() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        let result = tracker.activate_route(Route::new(2, "Nothing", Vec::new()));
        assert!(result == Err(TrackerError::EmptyRoute("Nothing".to_string())));
        assert!(tracker.status() == TrackerStatus::Idle);
        assert!(tracker.route().is_none());
        assert!(tracker.target_index().is_none());
        assert!(drain(&event_rx).is_empty());
    }

    #[test]
    fn test_activate_keeps_location() {
        let (mut tracker, _event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        tracker.on_location(Coordinate::new(0.0, 0.0015));
        assert!(tracker.last_closest().is_some());

        tracker.activate_route(line()).unwrap();
        assert!(tracker.last_location() == Some(Coordinate::new(0.0, 0.0015)));
        assert!(tracker.last_closest().is_none());
        assert!(tracker.last_target_distance().is_none());
        assert!(tracker.target_index() == Some(0));
    }

    #[test]
    fn test_deactivate() {
        let (mut tracker, _event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        tracker.on_location(Coordinate::new(0.0, 0.0015));
        tracker.deactivate();
        assert!(tracker.status() == TrackerStatus::Idle);
        assert!(tracker.route().is_none());
        assert!(tracker.target_index().is_none());
        assert!(tracker.last_location().is_none());
        assert!(tracker.last_closest().is_none());
        assert!(tracker.last_target_distance().is_none());
    }

    #[test]
    fn test_location_events() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        let result = tracker.on_location(Coordinate::new(0.0, 0.0015)).unwrap();
        assert!(result.target.as_ref().map(|t| t.index) == Some(0));
        let events = drain(&event_rx);
        assert!(events.len() == 2);
        match events[0] {
            TrackerEvent::ClosestWaypointUpdated(ref point) => assert!(point.index == 1),
            _ => panic!("Expected closest waypoint first, got {:?}", events[0]),
        }
        match events[1] {
            TrackerEvent::TargetDistanceUpdated(ref point) => {
                assert!(point.index == 0);
                assert!(point.result.distance > 100.0);
            },
            _ => panic!("Expected target distance second, got {:?}", events[1]),
        }
        assert!(tracker.last_location() == Some(Coordinate::new(0.0, 0.0015)));
        assert!(tracker.last_closest().map(|p| p.index) == Some(1));
        assert!(tracker.last_target_distance().map(|p| p.index) == Some(0));
    }

    #[test]
    fn test_arrival_advances() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        // About 14 m east of the first waypoint
        tracker.on_location(Coordinate::new(0.0, 0.000126));
        let events = drain(&event_rx);
        assert!(target_changes(&events) == vec![1]);
        assert!(tracker.target_index() == Some(1));
        assert!(tracker.last_target_distance().is_none());

        // About 16 m away from the second waypoint is not an arrival
        tracker.on_location(Coordinate::new(0.0, 0.001144));
        let events = drain(&event_rx);
        assert!(target_changes(&events).is_empty());
        assert!(tracker.target_index() == Some(1));
        assert!(tracker.last_target_distance().map(|p| p.index) == Some(1));
    }

    #[test]
    fn test_arrival_radius_is_strict() {
        let (mut tracker, event_rx) = tracker(TrackerConfig {
            arrival_radius: 0.0,
            refresh_on_target_change: false,
            destination_radius: None,
        });
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        tracker.on_location(Coordinate::new(0.0, 0.0));
        assert!(target_changes(&drain(&event_rx)).is_empty());
        assert!(tracker.target_index() == Some(0));
    }

    #[test]
    fn test_arrival_radius_boundary() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        let origin = Coordinate::new(0.0, 0.0);
        let outside = Coordinate::new(0.0, 0.0001348);
        let inside = Coordinate::new(0.0, 0.0001347);
        let outside_m = distance_between(&outside, &origin).distance;
        let inside_m = distance_between(&inside, &origin).distance;
        assert!(outside_m > 15.0 && outside_m < 15.01);
        assert!(inside_m < 15.0 && inside_m > 14.99);

        tracker.on_location(outside);
        assert!(target_changes(&drain(&event_rx)).is_empty());
        assert!(tracker.target_index() == Some(0));

        tracker.on_location(inside);
        assert!(target_changes(&drain(&event_rx)) == vec![1]);
        assert!(tracker.target_index() == Some(1));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        let route = Route::new(
            3,
            "Repeat",
            vec![Waypoint::new(2, 0.0, 0.01), Waypoint::new(1, 0.0, 0.02), Waypoint::new(2, 0.0, 0.0)]);
        let result = tracker.activate_route(route);
        assert!(
            result == Err(TrackerError::DuplicateWaypoint {
                route: "Repeat".to_string(),
                id: WaypointId(2),
            }));
        assert!(tracker.status() == TrackerStatus::Idle);
        assert!(drain(&event_rx).is_empty());
    }

    #[test]
    fn test_target_is_the_selected_waypoint() {
        // Only the first waypoint has an id of its own
        let route = parse_json(
            r#"{"title": "Partial ids", "waypoints": [
                {"id": 2, "latitude": 0.0, "longitude": 0.01},
                {"latitude": 0.0, "longitude": 0.02},
                {"latitude": 0.0, "longitude": 0.0}
            ]}"#).unwrap();
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(route).unwrap();
        tracker.select_waypoint(2).unwrap();
        drain(&event_rx);

        let result = tracker.on_location(Coordinate::new(0.0, 0.0)).unwrap();
        let target = result.target.unwrap();
        assert!(target.index == 2);
        assert!(target.result.distance == 0.0);
        let completions = drain(&event_rx)
            .iter()
            .filter(|event| match **event {
                TrackerEvent::RouteCompleted { index, .. } => index == 2,
                _ => false,
            })
            .count();
        assert!(completions == 1);
    }

    #[test]
    fn test_destination_entered() {
        let mut route = line();
        route.destinations = vec![
            Destination::new(7, 0.0, 0.0015, 30.0),
            Destination::new(8, 0.0, 0.003, 30.0),
        ];
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(route).unwrap();
        drain(&event_rx);

        // Entered ids are positive, left ids negative
        let changes = |events: Vec<TrackerEvent>| -> Vec<i64> {
            events
                .iter()
                .filter_map(|event| match *event {
                    TrackerEvent::DestinationEntered(ref active) => Some(active.destination.id as i64),
                    TrackerEvent::DestinationLeft { id } => Some(-(id as i64)),
                    _ => None,
                })
                .collect()
        };

        tracker.on_location(Coordinate::new(0.0, 0.0014));
        assert!(changes(drain(&event_rx)) == vec![7]);
        assert!(tracker.active_destination() == Some(7));

        // Still inside, nothing new
        tracker.on_location(Coordinate::new(0.0, 0.0016));
        assert!(changes(drain(&event_rx)).is_empty());

        tracker.on_location(Coordinate::new(0.0, 0.0022));
        assert!(changes(drain(&event_rx)) == vec![-7]);
        assert!(tracker.active_destination().is_none());

        tracker.on_location(Coordinate::new(0.0, 0.003));
        assert!(changes(drain(&event_rx)) == vec![8]);

        tracker.deactivate();
        assert!(tracker.active_destination().is_none());
    }

    #[test]
    fn test_destination_radius_override() {
        let mut route = line();
        route.destinations = vec![Destination::new(7, 0.0, 0.0015, 5.0)];
        let (mut tracker, event_rx) = tracker(TrackerConfig {
            refresh_on_target_change: false,
            destination_radius: Some(100.0),
            ..TrackerConfig::default()
        });
        tracker.activate_route(route).unwrap();
        drain(&event_rx);

        // About 56 m away, outside its own radius but inside the override
        tracker.on_location(Coordinate::new(0.0, 0.002));
        assert!(tracker.active_destination() == Some(7));
    }

    #[test]
    fn test_route_complete() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        tracker.select_waypoint(2).unwrap();
        drain(&event_rx);

        assert!(tracker.advance(1) == Err(TrackerError::RouteComplete { last_index: 2 }));
        assert!(tracker.target_index() == Some(2));
        assert!(drain(&event_rx).is_empty());

        tracker.on_location(Coordinate::new(0.0, 0.002));
        tracker.on_location(Coordinate::new(0.0, 0.002));
        let events = drain(&event_rx);
        assert!(target_changes(&events).is_empty());
        let completions = events
            .iter()
            .filter(|event| match **event {
                TrackerEvent::RouteCompleted { index, .. } => index == 2,
                _ => false,
            })
            .count();
        assert!(completions == 1);
        assert!(tracker.target_index() == Some(2));
        assert!(tracker.status() == TrackerStatus::Tracking);
    }

    #[test]
    fn test_advance_bounds() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        assert!(tracker.previous_waypoint() == Err(TrackerError::AtStart));
        assert!(tracker.next_waypoint() == Ok(1));
        assert!(tracker.next_waypoint() == Ok(2));
        assert!(tracker.previous_waypoint() == Ok(1));
        assert!(tracker.advance(5) == Err(TrackerError::RouteComplete { last_index: 2 }));
        assert!(tracker.advance(-5) == Err(TrackerError::AtStart));
        assert!(tracker.target_index() == Some(1));
        assert!(target_changes(&drain(&event_rx)) == vec![1, 2, 1]);
    }

    #[test]
    fn test_select_waypoint() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        drain(&event_rx);

        assert!(tracker.select_waypoint(2) == Ok(2));
        assert!(tracker.select_waypoint(3) == Err(TrackerError::OutOfBounds { index: 3, len: 3 }));
        assert!(tracker.target_index() == Some(2));
        assert!(tracker.select_waypoint(0) == Ok(0));
        assert!(target_changes(&drain(&event_rx)) == vec![2, 0]);
    }

    #[test]
    fn test_recompute() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        assert!(!tracker.recompute_target_distance());

        tracker.on_location(Coordinate::new(0.0, 0.0015));
        tracker.next_waypoint().unwrap();
        assert!(tracker.last_target_distance().is_none());
        drain(&event_rx);

        assert!(tracker.recompute_target_distance());
        let events = drain(&event_rx);
        assert!(events.len() == 1);
        match events[0] {
            TrackerEvent::TargetDistanceUpdated(ref point) => {
                assert!(point.index == 1);
                assert!(point.waypoint.id == WaypointId(1));
            },
            _ => panic!("Expected target distance, got {:?}", events[0]),
        }
        assert!(tracker.last_target_distance().map(|p| p.index) == Some(1));
    }

    #[test]
    fn test_refresh_on_target_change() {
        let (mut tracker, event_rx) = tracker(TrackerConfig::default());
        tracker.activate_route(line()).unwrap();
        tracker.on_location(Coordinate::new(0.0, 0.0015));
        drain(&event_rx);

        tracker.next_waypoint().unwrap();
        let events = drain(&event_rx);
        assert!(events.len() == 2);
        assert!(target_changes(&events) == vec![1]);
        match events[1] {
            TrackerEvent::TargetDistanceUpdated(ref point) => assert!(point.index == 1),
            _ => panic!("Expected target distance, got {:?}", events[1]),
        }
        assert!(tracker.last_target_distance().map(|p| p.index) == Some(1));
    }

    #[test]
    fn test_refresh_does_not_cascade() {
        let (mut tracker, event_rx) = tracker(TrackerConfig::default());
        let route = Route::new(
            1,
            "Cluster",
            vec![
                Waypoint::new(0, 0.0, 0.0),
                Waypoint::new(1, 0.0, 0.00001),
                Waypoint::new(2, 0.0, 0.00002),
            ]);
        tracker.activate_route(route).unwrap();
        drain(&event_rx);

        // Every waypoint is within the radius, but one fix moves one step
        tracker.on_location(Coordinate::new(0.0, 0.0));
        assert!(target_changes(&drain(&event_rx)) == vec![1]);
        assert!(tracker.target_index() == Some(1));
    }

    #[test]
    fn test_start_is_idempotent() {
        let (mut tracker, event_rx) = quiet_tracker();
        assert!(tracker.handle(Command::Start(line())).is_ok());
        tracker.handle(Command::NextWaypoint).unwrap();
        drain(&event_rx);

        assert!(tracker.handle(Command::Start(line())).is_ok());
        assert!(tracker.target_index() == Some(1));
        assert!(drain(&event_rx).is_empty());

        // A different route restarts
        let mut other = line();
        other.id = 2;
        assert!(tracker.handle(Command::Start(other)).is_ok());
        assert!(tracker.target_index() == Some(0));
        assert!(target_changes(&drain(&event_rx)) == vec![0]);
    }

    #[test]
    fn test_commands() {
        let (mut tracker, _event_rx) = quiet_tracker();
        assert!(tracker.handle(Command::Stop).is_ok());
        assert!(tracker.handle(Command::NextWaypoint) == Err(TrackerError::NotTracking));

        tracker.handle(Command::Start(line())).unwrap();
        tracker.handle(Command::SelectWaypoint(2)).unwrap();
        assert!(tracker.handle(Command::NextWaypoint) == Err(TrackerError::RouteComplete { last_index: 2 }));
        tracker.handle(Command::PreviousWaypoint).unwrap();
        assert!(tracker.target_index() == Some(1));
        assert!(tracker.handle(Command::SelectWaypoint(9)) == Err(TrackerError::OutOfBounds { index: 9, len: 3 }));

        tracker.handle(Command::Stop).unwrap();
        assert!(tracker.status() == TrackerStatus::Idle);
        assert!(tracker.handle(Command::Stop).is_ok());
    }

    #[test]
    fn test_events_only_name_route_waypoints() {
        let (mut tracker, event_rx) = tracker(TrackerConfig::default());
        let route = line();
        tracker.activate_route(route.clone()).unwrap();
        for longitude in [0.0, 0.0005, 0.001, 0.0015, 0.002, 0.003].iter() {
            tracker.on_location(Coordinate::new(0.0, *longitude));
        }
        tracker.previous_waypoint().ok();
        for event in drain(&event_rx) {
            let (waypoint, index) = match event {
                TrackerEvent::ClosestWaypointUpdated(point) => (point.waypoint, point.index),
                TrackerEvent::TargetDistanceUpdated(point) => (point.waypoint, point.index),
                TrackerEvent::TargetChanged { waypoint, index } => (waypoint, index),
                TrackerEvent::RouteCompleted { waypoint, index } => (waypoint, index),
                TrackerEvent::DestinationEntered(_) | TrackerEvent::DestinationLeft { .. } => continue,
            };
            assert!(route.waypoints[index] == waypoint);
        }
    }

    #[test]
    fn test_end_to_end() {
        let (mut tracker, event_rx) = quiet_tracker();
        tracker.activate_route(line()).unwrap();
        assert!(tracker.target_index() == Some(0));

        // About 1 m from W1 and 110 m from W0
        let fix = Coordinate::new(0.0, 0.00099);
        let result = tracker.on_location(fix).unwrap();
        assert!(result.closest.map(|p| p.waypoint.id) == Some(WaypointId(1)));
        assert!(tracker.target_index() == Some(0));

        tracker.select_waypoint(1).unwrap();
        drain(&event_rx);
        tracker.on_location(fix);
        assert!(target_changes(&drain(&event_rx)) == vec![2]);
        assert!(tracker.target_index() == Some(2));
    }
}
