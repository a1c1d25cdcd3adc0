use std::sync::mpsc::Sender;

use crate::geodesy::Coordinate;
use crate::proximity::{ActiveDestination, CalculatedPoint};
use crate::route::{Route, Waypoint};


/**
 * Everything the tracker tells the outside world.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    ClosestWaypointUpdated(CalculatedPoint),
    TargetDistanceUpdated(CalculatedPoint),
    TargetChanged { waypoint: Waypoint, index: usize },
    RouteCompleted { waypoint: Waypoint, index: usize },
    /// The location moved inside a destination other than the last one.
    DestinationEntered(ActiveDestination),
    DestinationLeft { id: u64 },
}


/**
 * Navigation commands from the user.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Start(Route),
    Stop,
    NextWaypoint,
    PreviousWaypoint,
    SelectWaypoint(usize),
}


/**
 * What the location provider hands to the tracking service.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderMessage {
    Fix(Coordinate),
    Command(Command),
}


/**
 * Receives tracker events synchronously, at the point they are computed.
 */
pub trait TrackerObserver {
    fn on_event(&mut self, event: &TrackerEvent);
}


impl TrackerObserver for Sender<TrackerEvent> {
    fn on_event(&mut self, event: &TrackerEvent) {
        match self.send(event.clone()) {
            Ok(_) => (),
            Err(e) => debug!("Event subscriber is gone, dropping {:?}", e.0),
        }
    }
}
