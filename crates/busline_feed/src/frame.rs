use busline_core::{GeoPosition, PositionUpdate, VehicleId};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame is not a JSON object")]
    NotAnObject,

    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{0}' is not numeric")]
    NotNumeric(&'static str),

    #[error("Coordinates out of range ({lat}, {lng})")]
    OutOfRange { lat: f64, lng: f64 },
}

/// Parses a feed payload `{busId, latitude, longitude, description?, ...}`.
///
/// Unknown fields are ignored. The arrival order is assigned later, when the
/// update is published.
pub fn parse_position_frame(payload: &str) -> Result<PositionUpdate, FrameError> {
    let value: Value = serde_json::from_str(payload)?;
    let object = value.as_object().ok_or(FrameError::NotAnObject)?;

    let vehicle_id = vehicle_id(object.get("busId"))?;
    let lat = number(object.get("latitude"), "latitude")?;
    let lng = number(object.get("longitude"), "longitude")?;

    let position = GeoPosition::new(lat, lng);
    if !position.is_valid() {
        return Err(FrameError::OutOfRange { lat, lng });
    }

    let mut update = PositionUpdate::new(vehicle_id, position);
    if let Some(description) = object.get("description").and_then(Value::as_str) {
        update = update.with_description(description);
    }

    Ok(update)
}

fn number(value: Option<&Value>, field: &'static str) -> Result<f64, FrameError> {
    match value {
        None | Some(Value::Null) => Err(FrameError::MissingField(field)),
        Some(value) => value.as_f64().ok_or(FrameError::NotNumeric(field)),
    }
}

fn vehicle_id(value: Option<&Value>) -> Result<VehicleId, FrameError> {
    let raw = number(value, "busId")?;

    // ids are integers, but some senders serialize them as 3.0
    if let Some(id) = value.and_then(Value::as_u64) {
        return Ok(VehicleId::new(id));
    }

    if raw.fract() == 0.0 && raw >= 0.0 && raw <= u64::MAX as f64 {
        return Ok(VehicleId::new(raw as u64));
    }

    Err(FrameError::NotNumeric("busId"))
}
