/*!
 * Reads position fixes out of NMEA 0183 sentences.
 */

use crate::error::NmeaError;
use crate::geodesy::Coordinate;


macro_rules! bail_none {
    ($option:expr) => (
        match $option {
            Some(s) => s,
            None => return Err(NmeaError::TooShort),
        }
    );
}


#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NmeaMessage {
    /// GGA: Global positioning system fix data.
    Gga { coordinate: Coordinate, hdop: f64 },
    /// RMC: Recommended minimum specific GNSS data.
    Rmc { coordinate: Coordinate, course_d: Option<f64> },
    /// GLL: Geographic position, latitude and longitude.
    Gll { coordinate: Coordinate },
}


impl NmeaMessage {
    pub fn parse(message: &str) -> Result<NmeaMessage, NmeaError> {
        let body = strip_checksum(message.trim())?;
        let mut iterator = body.split(',');
        let message_type = bail_none!(iterator.next());
        // Talker ids vary between GPS only (GP) and multi constellation (GN)
        if !message_type.starts_with('$') || message_type.len() != 6 || !message_type.is_ascii() {
            return Err(NmeaError::Unsupported);
        }

        match &message_type[3..] {
            "GGA" => {
                // $GPGGA,hhmmss.sss,ddmm.mmmm,a,dddmm.mmmm,a,x,xx,x.x,x.x,M,,,,xxxx*hh
                iterator.next();  // Skip the timestamp since midnight UTC
                let coordinate = parse_coordinate(&mut iterator)?;
                let quality = bail_none!(iterator.next());
                if quality == "0" {
                    return Err(NmeaError::NoFix);
                }
                iterator.next();  // Skip the satellites used
                let hdop = parse_float(bail_none!(iterator.next()))?;
                Ok(NmeaMessage::Gga {
                    coordinate: coordinate,
                    hdop: hdop,
                })
            },
            "RMC" => {
                // $GPRMC,hhmmss.sss,A,ddmm.mmmm,a,dddmm.mmmm,a,x.x,x.x,ddmmyy,,,a*hh
                iterator.next();  // Skip the timestamp
                if bail_none!(iterator.next()) != "A" {
                    return Err(NmeaError::NoFix);
                }
                let coordinate = parse_coordinate(&mut iterator)?;
                iterator.next();  // Skip the speed in knots
                let course_d = match iterator.next() {
                    Some(course) if !course.is_empty() => Some(parse_float(course)?),
                    _ => None,
                };
                Ok(NmeaMessage::Rmc {
                    coordinate: coordinate,
                    course_d: course_d,
                })
            },
            "GLL" => {
                // $GPGLL,ddmm.mmmm,a,dddmm.mmmm,a,hhmmss.sss,A,a*hh
                let coordinate = parse_coordinate(&mut iterator)?;
                iterator.next();  // Skip the timestamp
                if bail_none!(iterator.next()) != "A" {
                    return Err(NmeaError::NoFix);
                }
                Ok(NmeaMessage::Gll { coordinate: coordinate })
            },
            _ => Err(NmeaError::Unsupported),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match *self {
            NmeaMessage::Gga { coordinate, .. } => coordinate,
            NmeaMessage::Rmc { coordinate, .. } => coordinate,
            NmeaMessage::Gll { coordinate } => coordinate,
        }
    }
}


/**
 * Verifies and removes the trailing *hh checksum, if there is one.
 */
fn strip_checksum(message: &str) -> Result<&str, NmeaError> {
    let star = match message.rfind('*') {
        Some(position) => position,
        None => return Ok(message),
    };
    let (body, checksum) = (&message[..star], &message[star + 1..]);
    let expected = match u8::from_str_radix(checksum, 16) {
        Ok(value) => value,
        Err(_) => return Err(NmeaError::InvalidField(checksum.to_string())),
    };
    // The checksum covers everything between $ and *
    let computed = body.bytes().skip(1).fold(0u8, |acc, byte| acc ^ byte);
    if computed != expected {
        return Err(NmeaError::Checksum {
            expected: expected,
            computed: computed,
        });
    }
    Ok(body)
}


fn parse_float(field: &str) -> Result<f64, NmeaError> {
    match field.parse::<f64>() {
        Ok(value) => Ok(value),
        Err(_) => Err(NmeaError::InvalidField(field.to_string())),
    }
}


/**
 * Parses a ddmm.mmmm,N,dddmm.mmmm,E field group.
 */
fn parse_coordinate<'a, I>(iterator: &mut I) -> Result<Coordinate, NmeaError>
where
    I: Iterator<Item = &'a str>,
{
    let latitude = parse_degrees_minutes(bail_none!(iterator.next()), 2)?;
    let north = match bail_none!(iterator.next()) {
        "N" => true,
        "S" => false,
        "" => return Err(NmeaError::NoFix),
        other => return Err(NmeaError::InvalidField(other.to_string())),
    };
    let longitude = parse_degrees_minutes(bail_none!(iterator.next()), 3)?;
    let east = match bail_none!(iterator.next()) {
        "E" => true,
        "W" => false,
        "" => return Err(NmeaError::NoFix),
        other => return Err(NmeaError::InvalidField(other.to_string())),
    };
    Ok(Coordinate::new(
        if north { latitude } else { -latitude },
        if east { longitude } else { -longitude }))
}


fn parse_degrees_minutes(field: &str, degree_digits: usize) -> Result<f64, NmeaError> {
    if field.is_empty() {
        return Err(NmeaError::NoFix);
    }
    if field.len() < degree_digits || !field.is_char_boundary(degree_digits) {
        return Err(NmeaError::InvalidField(field.to_string()));
    }
    let degrees: u32 = match field[0..degree_digits].parse() {
        Ok(d) => d,
        Err(_) => return Err(NmeaError::InvalidField(field.to_string())),
    };
    let minutes = parse_float(&field[degree_digits..])?;
    Ok(degrees as f64 + minutes / 60.0)
}
