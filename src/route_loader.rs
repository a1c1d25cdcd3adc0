use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use serde::Deserialize;

use crate::error::RouteError;
use crate::geodesy::Coordinate;
use crate::route::{Destination, Route, Waypoint, WaypointId};


/**
 * Loads a route from a KML, GPX or JSON file, chosen by extension.
 */
pub fn load_route(file_name: &Path) -> Result<Route, RouteError> {
    let extension = file_name
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default();
    if !["kml", "gpx", "json"].contains(&extension.as_str()) {
        return Err(RouteError::UnsupportedFormat(extension));
    }
    let contents = fs::read_to_string(file_name)?;
    let fallback_title = file_name
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("route");

    let route = match extension.as_str() {
        "kml" => parse_kml(&contents, fallback_title)?,
        "gpx" => parse_gpx(&contents, fallback_title)?,
        _ => parse_json(&contents)?,
    };
    info!(
        "Loaded route '{}' with {} waypoints from {}",
        route.title,
        route.len(),
        file_name.display());
    Ok(route)
}


/**
 * Reads the text content of the element that was just opened.
 */
fn read_text(reader: &mut Reader<&[u8]>, start: &BytesStart) -> Result<String, RouteError> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e)),
            Event::GeneralRef(e) => {
                let name = String::from_utf8_lossy(&e).into_owned();
                match e.resolve_char_ref()? {
                    Some(ch) => text.push(ch),
                    None => match resolve_predefined_entity(&name) {
                        Some(resolved) => text.push_str(resolved),
                        None => warn!("Skipping unknown entity &{};", name),
                    },
                }
            },
            Event::End(e) if e.name().0 == end_name.as_slice() => break,
            Event::Eof => break,
            _ => (),
        }
    }
    Ok(text.trim().to_string())
}


/**
 * Every <coordinates> element contributes its lon,lat[,alt] tuples in
 * document order. The first <name> is the route title.
 */
pub fn parse_kml(xml: &str, fallback_title: &str) -> Result<Route, RouteError> {
    let mut reader = Reader::from_str(xml);
    let mut title: Option<String> = None;
    let mut coordinates = Vec::<Coordinate>::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"coordinates" => {
                    let text = read_text(&mut reader, &e)?;
                    for long_lat_alt in text.split_whitespace() {
                        match parse_kml_tuple(long_lat_alt) {
                            Ok(coordinate) => coordinates.push(coordinate),
                            Err(e) => warn!("Skipping coordinate '{}': {}", long_lat_alt, e),
                        }
                    }
                },
                b"name" if title.is_none() => title = Some(read_text(&mut reader, &e)?),
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }
    }

    let title = title.unwrap_or_else(|| fallback_title.to_string());
    Ok(Route::from_coordinates(0, &title, &coordinates))
}


fn parse_kml_tuple(long_lat_alt: &str) -> Result<Coordinate, RouteError> {
    let mut iterator = long_lat_alt.split(',');
    let longitude = parse_degrees("longitude", iterator.next())?;
    let latitude = parse_degrees("latitude", iterator.next())?;
    Ok(Coordinate::new(latitude, longitude))
}


fn parse_degrees(field: &'static str, value: Option<&str>) -> Result<f64, RouteError> {
    let value = match value {
        Some(value) => value.trim(),
        None => return Err(RouteError::MissingAttribute(field)),
    };
    match value.parse::<f64>() {
        Ok(degrees) => Ok(degrees),
        Err(_) => Err(RouteError::InvalidCoordinate {
            field: field,
            value: value.to_string(),
        }),
    }
}


fn parse_lat_lon(e: &BytesStart) -> Result<Coordinate, RouteError> {
    let mut latitude: Option<String> = None;
    let mut longitude: Option<String> = None;
    for attribute in e.attributes() {
        let attribute = match attribute {
            Ok(attribute) => attribute,
            Err(e) => return Err(RouteError::Xml(e.into())),
        };
        let value = String::from_utf8_lossy(&attribute.value).into_owned();
        match attribute.key.local_name().as_ref() {
            b"lat" => latitude = Some(value),
            b"lon" => longitude = Some(value),
            _ => (),
        }
    }
    Ok(Coordinate::new(
        parse_degrees("lat", latitude.as_deref())?,
        parse_degrees("lon", longitude.as_deref())?))
}


/**
 * Uses the <rtept> points of the first <rte>, or every <wpt> if the file
 * has no route.
 */
pub fn parse_gpx(xml: &str, fallback_title: &str) -> Result<Route, RouteError> {
    let mut reader = Reader::from_str(xml);
    let mut route_title: Option<String> = None;
    let mut route_points = Vec::<Waypoint>::new();
    let mut waypoints = Vec::<Waypoint>::new();
    let mut routes_seen = 0;
    // The point whose children are being read, and whether it is a <rtept>
    let mut current: Option<(Waypoint, bool)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"rte" => routes_seen += 1,
                b"wpt" | b"rtept" => {
                    let coordinate = parse_lat_lon(&e)?;
                    let is_route_point = e.local_name().as_ref() == b"rtept";
                    current = Some((
                        Waypoint {
                            id: WaypointId(0),
                            coordinate: coordinate,
                            title: None,
                        },
                        is_route_point));
                },
                b"name" => {
                    let name = read_text(&mut reader, &e)?;
                    match current {
                        Some((ref mut waypoint, _)) => waypoint.title = Some(name),
                        None if routes_seen == 1 && route_title.is_none() => route_title = Some(name),
                        None => (),
                    }
                },
                _ => (),
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"wpt" => waypoints.push(Waypoint {
                    id: WaypointId(0),
                    coordinate: parse_lat_lon(&e)?,
                    title: None,
                }),
                b"rtept" if routes_seen == 1 => route_points.push(Waypoint {
                    id: WaypointId(0),
                    coordinate: parse_lat_lon(&e)?,
                    title: None,
                }),
                _ => (),
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"wpt" | b"rtept" => match current.take() {
                    Some((waypoint, true)) if routes_seen == 1 => route_points.push(waypoint),
                    Some((waypoint, false)) => waypoints.push(waypoint),
                    _ => (),
                },
                _ => (),
            },
            Event::Eof => break,
            _ => (),
        }
    }

    let (title, mut points) = if route_points.is_empty() {
        (fallback_title.to_string(), waypoints)
    } else {
        (route_title.unwrap_or_else(|| fallback_title.to_string()), route_points)
    };
    for (index, waypoint) in points.iter_mut().enumerate() {
        waypoint.id = WaypointId(index as u64);
    }
    Ok(Route::new(0, &title, points))
}


#[derive(Deserialize)]
struct RouteRecord {
    #[serde(alias = "pk", default)]
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    waypoints: Vec<WaypointRecord>,
    #[serde(default)]
    destinations: Vec<DestinationRecord>,
}


#[derive(Deserialize)]
struct WaypointRecord {
    #[serde(alias = "pk")]
    id: Option<u64>,
    #[serde(flatten)]
    coordinate: Coordinate,
    title: Option<String>,
}


#[derive(Deserialize)]
struct DestinationRecord {
    #[serde(alias = "pk", default)]
    id: u64,
    #[serde(flatten)]
    coordinate: Coordinate,
    radius: f64,
    title: Option<String>,
}


/**
 * Reads a route in the JSON shape served by the tour route API. Waypoints
 * without an id are numbered after the largest explicit id, so generated ids
 * never collide with given ones.
 */
pub fn parse_json(json: &str) -> Result<Route, RouteError> {
    let record: RouteRecord = serde_json::from_str(json)?;
    let mut next_id = record.waypoints
        .iter()
        .filter_map(|waypoint| waypoint.id)
        .max()
        .map_or(0, |id| id.saturating_add(1));
    let waypoints = record.waypoints
        .into_iter()
        .map(|waypoint| {
            let id = match waypoint.id {
                Some(id) => id,
                None => {
                    next_id += 1;
                    next_id - 1
                }
            };
            Waypoint {
                id: WaypointId(id),
                coordinate: waypoint.coordinate,
                title: waypoint.title,
            }
        })
        .collect();
    let destinations = record.destinations
        .into_iter()
        .map(|destination| Destination {
            id: destination.id,
            coordinate: destination.coordinate,
            radius: destination.radius,
            title: destination.title,
        })
        .collect();
    Ok(Route {
        id: record.id,
        title: record.title,
        description: record.description,
        waypoints: waypoints,
        destinations: destinations,
    })
}
