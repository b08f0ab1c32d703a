//! WebSocket event frame.
//!
//! One text frame per event:
//! `{"type": "<kind>", "data": {...}, "timestamp": <unix millis>}`.

use serde_json::Value;

use crate::domain::Event;

/// Serialize `event` into its wire frame.
pub fn encode_event(event: &Event) -> Result<String, serde_json::Error> {
    let mut frame = serde_json::to_value(event.payload())?;
    if let Value::Object(fields) = &mut frame {
        fields.insert(
            "timestamp".to_string(),
            Value::from(event.timestamp().value()),
        );
    }
    serde_json::to_string(&frame)
}
