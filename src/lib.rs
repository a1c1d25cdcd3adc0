#[macro_use]
extern crate log;

pub mod config;
pub mod error;
pub mod geodesy;
pub mod location_provider;
pub mod logger;
pub mod nmea;
pub mod notifier;
pub mod proximity;
pub mod route;
pub mod route_loader;
pub mod service;
pub mod stdout_logger;
pub mod tracker;
pub mod tracker_message;
