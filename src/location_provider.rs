use std::io::BufRead;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::MilliSeconds;
use crate::geodesy::Coordinate;
use crate::nmea::NmeaMessage;
use crate::route::Route;
use crate::tracker_message::{Command, ProviderMessage};


/**
 * One parsed line of provider input.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum InputLine {
    Message(ProviderMessage),
    Quit,
    Blank,
}


/**
 * Feeds location fixes and user commands to the tracking service. Input is
 * line based: NMEA sentences or "lat,lon" pairs are fixes, and the words
 * start, stop, next, prev, select N and quit are commands.
 */
pub struct LocationProvider {
    message_tx: Sender<ProviderMessage>,
    poll_interval: Duration,
    route: Option<Route>,
    last_fix: Option<Instant>,
}


impl LocationProvider {
    /**
     * The route is what the start command activates.
     */
    pub fn new(
        message_tx: Sender<ProviderMessage>,
        poll_interval_ms: MilliSeconds,
        route: Option<Route>,
    ) -> LocationProvider {
        LocationProvider {
            message_tx: message_tx,
            poll_interval: Duration::from_millis(poll_interval_ms),
            route: route,
            last_fix: None,
        }
    }

    /**
     * Reads input until it runs out, the service goes away or a quit
     * arrives. Should be run in a thread.
     */
    pub fn run<R: BufRead>(&mut self, reader: R, quit_rx: Receiver<()>) {
        for line_result in reader.lines() {
            if quit_rx.try_recv().is_ok() {
                info!("Location provider shutting down");
                return;
            }

            let line = match line_result {
                Ok(line) => line,
                Err(e) => {
                    error!("Unable to read input line: {}", e);
                    break;
                }
            };

            let message = match self.parse_line(&line) {
                Ok(InputLine::Message(message)) => message,
                Ok(InputLine::Blank) => continue,
                Ok(InputLine::Quit) => {
                    info!("Quit requested");
                    return;
                },
                Err(e) => {
                    warn!("Skipping input line '{}': {}", line.trim(), e);
                    continue;
                }
            };

            if let ProviderMessage::Fix(_) = message {
                self.wait_for_poll_interval();
            }
            if let Err(e) = self.message_tx.send(message) {
                error!("Unable to send message to tracking service: {}", e);
                return;
            }
        }
        info!("Location provider reached the end of its input");
    }

    pub fn parse_line(&self, line: &str) -> Result<InputLine, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(InputLine::Blank);
        }

        if line.starts_with('$') {
            return match NmeaMessage::parse(line) {
                Ok(nmea) => Ok(InputLine::Message(ProviderMessage::Fix(nmea.coordinate()))),
                Err(e) => Err(e.to_string()),
            };
        }

        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(word) => word.to_ascii_lowercase(),
            None => return Ok(InputLine::Blank),
        };
        let message = match command.as_str() {
            "start" => match self.route {
                Some(ref route) => ProviderMessage::Command(Command::Start(route.clone())),
                None => return Err("no route to start, pass one with --route".to_string()),
            },
            "stop" => ProviderMessage::Command(Command::Stop),
            "next" => ProviderMessage::Command(Command::NextWaypoint),
            "prev" | "previous" => ProviderMessage::Command(Command::PreviousWaypoint),
            "select" => {
                let index = match words.next().map(|word| word.parse::<usize>()) {
                    Some(Ok(index)) => index,
                    Some(Err(e)) => return Err(format!("invalid waypoint index: {}", e)),
                    None => return Err("select needs a waypoint index".to_string()),
                };
                ProviderMessage::Command(Command::SelectWaypoint(index))
            },
            "quit" | "exit" => return Ok(InputLine::Quit),
            _ => ProviderMessage::Fix(parse_lat_lon(line)?),
        };
        Ok(InputLine::Message(message))
    }

    /**
     * Holds back fixes that arrive faster than the poll interval, the way a
     * platform location service would deliver them.
     */
    fn wait_for_poll_interval(&mut self) {
        if let Some(last_fix) = self.last_fix {
            let elapsed = last_fix.elapsed();
            if elapsed < self.poll_interval {
                thread::sleep(self.poll_interval - elapsed);
            }
        }
        self.last_fix = Some(Instant::now());
    }
}


fn parse_lat_lon(line: &str) -> Result<Coordinate, String> {
    let mut iterator = line.split(',');
    let latitude = match iterator.next().map(|s| s.trim().parse::<f64>()) {
        Some(Ok(latitude)) => latitude,
        _ => return Err(format!("unable to parse latitude from '{}'", line)),
    };
    let longitude = match iterator.next().map(|s| s.trim().parse::<f64>()) {
        Some(Ok(longitude)) => longitude,
        _ => return Err(format!("unable to parse longitude from '{}'", line)),
    };
    if iterator.next().is_some() {
        return Err(format!("too many fields in '{}'", line));
    }
    Ok(Coordinate::new(latitude, longitude))
}
