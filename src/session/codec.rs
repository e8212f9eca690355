/*!
 * Session value encoding.
 *
 * Session values travel to the backing table as a MessagePack blob of a
 * string-keyed map of JSON values.
 */

use serde_json::Value;
use std::collections::HashMap;

use crate::errors::SessionError;

/// In-memory key/value state of one session
pub type SessionValues = HashMap<String, Value>;

/// Encode session values into a blob
pub fn encode(values: &SessionValues) -> Result<Vec<u8>, SessionError> {
    Ok(rmp_serde::to_vec(values)?)
}

/// Decode a blob into session values. An empty blob is an empty session.
pub fn decode(data: &[u8]) -> Result<SessionValues, SessionError> {
    if data.is_empty() {
        return Ok(SessionValues::new());
    }
    Ok(rmp_serde::from_slice(data)?)
}
