use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::error::TrackerError;
use crate::tracker::Tracker;
use crate::tracker_message::ProviderMessage;

const QUIT_CHECK_INTERVAL_MS: u64 = 50;


/**
 * Long running host for the tracker. Receives fixes and commands from the
 * location provider and feeds them to the tracker, which notifies its
 * observers.
 */
pub struct TrackerService {
    tracker: Tracker,
}


impl TrackerService {
    pub fn new(tracker: Tracker) -> TrackerService {
        TrackerService { tracker: tracker }
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /**
     * Processes messages until the provider goes away or a quit arrives.
     * Messages already queued when the quit arrives are still processed.
     * Should be run in a thread.
     */
    pub fn run(&mut self, message_rx: Receiver<ProviderMessage>, quit_rx: Receiver<()>) {
        let config = self.tracker.config();
        info!(
            "Tracking service started, arrival radius {} m, destination radius {}",
            config.arrival_radius,
            match config.destination_radius {
                Some(radius) => format!("{} m", radius),
                None => "per destination".to_string(),
            });
        loop {
            match quit_rx.try_recv() {
                Ok(_) => {
                    while let Ok(message) = message_rx.try_recv() {
                        self.process(message);
                    }
                    info!("Tracking service shutting down");
                    return;
                },
                Err(_) => (),
            };

            match message_rx.recv_timeout(Duration::from_millis(QUIT_CHECK_INTERVAL_MS)) {
                Ok(message) => self.process(message),
                Err(RecvTimeoutError::Timeout) => (),
                Err(RecvTimeoutError::Disconnected) => {
                    info!("Location provider disconnected, tracking service shutting down");
                    return;
                },
            }
        }
    }

    pub fn process(&mut self, message: ProviderMessage) {
        match message {
            ProviderMessage::Fix(location) => {
                if !location.is_finite() {
                    warn!("Received a non finite location {:?}", location);
                }
                if self.tracker.on_location(location).is_none() {
                    debug!("Ignoring location fix while idle");
                }
            },
            ProviderMessage::Command(command) => {
                debug!("Received command {:?}", command);
                match self.tracker.handle(command) {
                    Ok(_) => (),
                    Err(e) => log_command_error(&e),
                }
            },
        }
    }
}


fn log_command_error(error: &TrackerError) {
    if error.is_boundary() {
        warn!("Unable to change waypoint: {}", error);
    } else {
        error!("Unable to apply command: {}", error);
    }
}
