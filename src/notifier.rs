use crate::geodesy::bearing_to_azimuth;
use crate::proximity::CalculatedPoint;
use crate::route::Destination;
use crate::tracker_message::{TrackerEvent, TrackerObserver};


/**
 * Keeps the text of the ongoing navigation notification up to date and logs
 * it whenever the target or its distance changes.
 */
pub struct Notifier {
    route_len: usize,
    target_index: Option<usize>,
    target_point: Option<CalculatedPoint>,
    destination: Option<Destination>,
    text: String,
}


impl Notifier {
    pub fn new(route_len: usize) -> Notifier {
        Notifier {
            route_len: route_len,
            target_index: None,
            target_point: None,
            destination: None,
            text: String::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn update(&mut self) {
        let index = match self.target_index {
            Some(index) => index.to_string(),
            None => "-".to_string(),
        };
        let distance = match self.target_point {
            Some(ref point) => format!("{:.2}", point.result.distance),
            None => "-".to_string(),
        };
        let final_bearing = self.target_point.as_ref().map(|point| point.result.final_bearing);
        let direction = match bearing_to_azimuth(final_bearing) {
            Some(azimuth) => format!("{:.1}", azimuth),
            None => "-".to_string(),
        };
        self.text = format!(
            "Follow to the next waypoint. {}/{}\nDistance: {} m.\nDirection: {}°",
            index,
            self.route_len,
            distance,
            direction);
        if let Some(ref destination) = self.destination {
            let name = destination.title.clone().unwrap_or_else(|| destination.id.to_string());
            self.text.push_str(&format!("\nNearby: {}", name));
        }
        info!("{}", self.text.replace('\n', " "));
    }
}


impl TrackerObserver for Notifier {
    fn on_event(&mut self, event: &TrackerEvent) {
        match *event {
            TrackerEvent::TargetChanged { index, .. } => {
                self.target_index = Some(index);
                self.target_point = None;
                self.update();
            },
            TrackerEvent::TargetDistanceUpdated(ref point) => {
                self.target_index = Some(point.index);
                self.target_point = Some(point.clone());
                self.update();
            },
            TrackerEvent::ClosestWaypointUpdated(ref point) => {
                debug!(
                    "Closest waypoint is {} at {:.2} m",
                    point.waypoint,
                    point.result.distance);
            },
            TrackerEvent::RouteCompleted { ref waypoint, index } => {
                info!("Route finished at waypoint {} ({}/{})", waypoint, index, self.route_len);
            },
            TrackerEvent::DestinationEntered(ref active) => {
                self.destination = Some(active.destination.clone());
                self.update();
            },
            TrackerEvent::DestinationLeft { id } => {
                if self.destination.as_ref().map(|destination| destination.id) == Some(id) {
                    self.destination = None;
                    self.update();
                }
            },
        }
    }
}
