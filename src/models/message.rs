// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire messages exchanged over a push connection.

use crate::models::{ActivityList, Coordinate, WeatherSnapshot};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Server-to-client message. Exactly one channel tag per message; a later
/// message with the same tag supersedes the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum PushMessage {
    Weather(WeatherSnapshot),
    Garmin(ActivityList),
}

impl PushMessage {
    /// Channel name, used for logging.
    pub fn channel(&self) -> &'static str {
        match self {
            PushMessage::Weather(_) => "weather",
            PushMessage::Garmin(_) => "garmin",
        }
    }

    /// Serialize to the JSON text frame sent to the client.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Why a client message was ignored.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Message has no numeric lat/lon")]
    MissingCoordinates,

    #[error("Coordinate out of range: lat={lat}, lon={lon}")]
    OutOfRange { lat: f64, lon: f64 },
}

#[derive(Deserialize)]
struct CoordinatePayload {
    lat: Option<serde_json::Number>,
    lon: Option<serde_json::Number>,
}

/// Parse a client text frame into the coordinate it carries.
///
/// Anything other than an object with numeric `lat` and `lon` is an error;
/// extra fields are allowed.
pub fn parse_client_message(raw: &str) -> Result<Coordinate, MessageError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(MessageError::MissingCoordinates);
    }

    // A non-numeric lat/lon is a shape error, not a JSON error.
    let payload: CoordinatePayload =
        serde_json::from_value(value).map_err(|_| MessageError::MissingCoordinates)?;

    let (lat, lon) = match (
        payload.lat.and_then(|n| n.as_f64()),
        payload.lon.and_then(|n| n.as_f64()),
    ) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(MessageError::MissingCoordinates),
    };

    Coordinate::new(lat, lon).ok_or(MessageError::OutOfRange { lat, lon })
}
