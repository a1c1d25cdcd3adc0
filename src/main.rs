#[macro_use]
extern crate log;

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::{JoinHandle, spawn};

use getopts::Options;

use waypoint_tracker::config::{Config, options};
use waypoint_tracker::location_provider::LocationProvider;
use waypoint_tracker::logger;
use waypoint_tracker::notifier::Notifier;
use waypoint_tracker::route::Route;
use waypoint_tracker::route_loader::load_route;
use waypoint_tracker::service::TrackerService;
use waypoint_tracker::tracker::Tracker;
use waypoint_tracker::tracker_message::{Command, ProviderMessage};


fn main() {
    let config = match handle_opts() {
        Some(config) => config,
        None => return,
    };
    info!("Starting up");

    let route = match config.route_file {
        Some(ref path) => match load_route(path) {
            Ok(route) => Some(route),
            Err(e) => {
                error!("Unable to load route {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => None,
    };

    let mut quitters = Vec::new();
    let mut join_handles = Vec::new();

    let (message_tx, message_rx) = channel();
    let (quit_service_tx, quit_service_rx) = channel();
    quitters.push(quit_service_tx);
    join_handles.push(spawn_service(&config, route.as_ref(), message_rx, quit_service_rx));

    // A route given on the command line is tracked right away
    if let Some(ref route) = route {
        match message_tx.send(ProviderMessage::Command(Command::Start(route.clone()))) {
            Ok(_) => (),
            Err(e) => error!("Unable to start route: {}", e),
        }
    }

    let (quit_provider_tx, quit_provider_rx) = channel();
    quitters.push(quit_provider_tx);
    let provider_handle = spawn_location_provider(&config, route, message_tx, quit_provider_rx);

    // The provider finishes when its input runs out or it reads quit
    match provider_handle.join() {
        Ok(_) => (),
        Err(_) => error!("Unable to join thread, child thread panicked"),
    }

    for quitter in quitters {
        match quitter.send(()) {
            Ok(_) => (),
            Err(e) => debug!("Unable to send quit message: {}", e),
        }
    }

    for handle in join_handles {
        match handle.join() {
            Ok(_) => (),
            Err(_) => error!("Unable to join thread, child thread panicked"),
        }
    }

    info!("Main thread shutting down");
}


fn spawn_service(
    config: &Config,
    route: Option<&Route>,
    message_rx: Receiver<ProviderMessage>,
    quit_rx: Receiver<()>,
) -> JoinHandle<()> {
    let mut tracker = Tracker::new(config.tracker);
    tracker.subscribe(Box::new(Notifier::new(route.map_or(0, |route| route.len()))));
    spawn(move || {
        let mut service = TrackerService::new(tracker);
        service.run(message_rx, quit_rx);
    })
}


fn spawn_location_provider(
    config: &Config,
    route: Option<Route>,
    message_tx: Sender<ProviderMessage>,
    quit_rx: Receiver<()>,
) -> JoinHandle<()> {
    let fixes_file = config.fixes_file.clone();
    let poll_interval_ms = config.poll_interval_ms;
    spawn(move || {
        let mut provider = LocationProvider::new(message_tx, poll_interval_ms, route);
        match fixes_file {
            Some(path) => match File::open(&path) {
                Ok(file) => provider.run(BufReader::new(file), quit_rx),
                Err(e) => error!("Unable to open fixes file {}: {}", path.display(), e),
            },
            None => {
                let stdin = io::stdin();
                provider.run(stdin.lock(), quit_rx);
            },
        }
    })
}


/**
 * Parses the command line and sets up logging. Returns None if the program
 * should exit.
 */
fn handle_opts() -> Option<Config> {
    let opts = options();
    let mut args = env::args();
    args.next();  // Skip the program name
    let matches = match opts.parse(args) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("Unable to parse options: {}", e);
            print_usage(&opts);
            process::exit(2);
        }
    };
    if matches.opt_present("h") {
        print_usage(&opts);
        return None;
    }

    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    match logger::init(config.log_level, config.log_file.as_deref()) {
        Ok(_) => (),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    Some(config)
}


fn print_usage(opts: &Options) {
    let brief = "Usage: waypoint-tracker [options]";
    print!("{}", opts.usage(brief));
}
