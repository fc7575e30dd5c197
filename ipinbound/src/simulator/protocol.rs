//! Simulator position datagram parsing.
//!
//! Flight simulators that can feed ForeFlight broadcast position as ASCII
//! text over UDP:
//!
//! ```text
//! XGPS<sim name>,<lon>,<lat>,<alt m MSL>,<true track deg>,<ground speed m/s>
//! ```
//!
//! Fields are comma separated and empty fields still count, so a message
//! must split into exactly six fields.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::geo::Coordinate;
use crate::location::{FixAccuracy, LocationFix};

/// Tag that starts every position message.
pub const XGPS_TAG: &[u8; 4] = b"XGPS";

/// Number of comma separated fields after the tag.
const FIELD_COUNT: usize = 6;

const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "sim_name",
    "longitude",
    "latitude",
    "altitude",
    "track",
    "ground_speed",
];

/// Why a datagram was not turned into a sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Not a position message; ignored without comment.
    #[error("Datagram does not start with XGPS")]
    UnrecognizedTag,

    #[error("Datagram is not valid UTF-8")]
    NotUtf8,

    #[error("Expected {expected} fields, found {count}", expected = FIELD_COUNT)]
    FieldCount { count: usize },

    #[error("Invalid {name} (field {index}): '{value}'")]
    InvalidField {
        index: usize,
        name: &'static str,
        value: String,
    },
}

/// One position report from a simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSample {
    pub sim_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude above mean sea level (m).
    pub altitude_m: f64,
    /// Track over the ground, degrees true.
    pub track_true_deg: f64,
    /// Ground speed (m/s).
    pub ground_speed_mps: f64,
    /// When the datagram arrived.
    pub received_at: DateTime<Utc>,
}

impl SimSample {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// The sample as a fix observed when the datagram arrived.
    pub fn to_location_fix(&self) -> LocationFix {
        LocationFix {
            coordinate: self.coordinate(),
            altitude_m: self.altitude_m,
            course_deg: Some(self.track_true_deg),
            speed_mps: Some(self.ground_speed_mps),
            accuracy: FixAccuracy {
                horizontal_m: Some(1.0),
                vertical_m: Some(1.0),
                course_deg: None,
                speed_mps: None,
            },
            timestamp: self.received_at,
            observed_at: self.received_at,
        }
    }
}

/// Parse one datagram.
pub fn parse_datagram(data: &[u8], received_at: DateTime<Utc>) -> Result<SimSample, ParseError> {
    let payload = data.strip_prefix(XGPS_TAG).ok_or(ParseError::UnrecognizedTag)?;
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::NotUtf8)?;
    let text = text.trim_end_matches(['\r', '\n']);

    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(ParseError::FieldCount {
            count: fields.len(),
        });
    }

    let number = |index: usize| -> Result<f64, ParseError> {
        fields[index]
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ParseError::InvalidField {
                index,
                name: FIELD_NAMES[index],
                value: fields[index].to_string(),
            })
    };

    Ok(SimSample {
        sim_name: fields[0].to_string(),
        longitude: number(1)?,
        latitude: number(2)?,
        altitude_m: number(3)?,
        track_true_deg: number(4)?,
        ground_speed_mps: number(5)?,
        received_at,
    })
}
