//! Response envelope and listing payload decoding
//!
//! Every response has the shape `{"status": "...", "data": {...}}`.
//! Listing payloads group elements by view:
//!
//! ```json
//! {"status": "SUCCESS", "data": {
//!     "public":  [{"n": "example.com"}],
//!     "private": [{"n": "corp.example.com"}]
//! }}
//! ```

use crate::coerce;
use serde::Deserialize;
use serde_json::{Map, Value};
use wdns_core::{Error, Record, Result, View, Zone};

/// Status value of a successful response
pub const STATUS_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    data: Value,
}

/// Decode a response body and return its `data` on success
///
/// A status other than `SUCCESS` becomes a backend error carrying the
/// stringified `data.error`, or a generic message when there is none.
pub fn parse_envelope(body: &str) -> Result<Value> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| Error::parse(format!("malformed response envelope: {}", e)))?;

    if envelope.status != STATUS_SUCCESS {
        let message = match envelope.data.get("error") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => format!("request failed with status {}", envelope.status),
        };
        return Err(Error::backend(message));
    }

    Ok(envelope.data)
}

/// Iterate the elements of each recognized view in payload order
///
/// Unknown views, non-array view values and non-object elements are skipped.
fn view_elements(data: &Value) -> Result<Vec<(View, &Map<String, Value>)>> {
    let views = data
        .as_object()
        .ok_or_else(|| Error::parse(format!("expected object payload, got {}", data)))?;

    let mut out = Vec::new();
    for (key, elems) in views {
        let Some(view) = View::from_backend_key(key) else {
            tracing::debug!("Skipping unknown view '{}' in payload", key);
            continue;
        };
        let Some(elems) = elems.as_array() else {
            tracing::debug!("Skipping view '{}': not an array", key);
            continue;
        };
        out.extend(
            elems
                .iter()
                .filter_map(Value::as_object)
                .map(|elem| (view, elem)),
        );
    }
    Ok(out)
}

fn field<'a>(elem: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    elem.get(key)
        .ok_or_else(|| Error::parse(format!("missing field '{}' in {}", key, Value::Object(elem.clone()))))
}

/// Decode a zone listing payload
pub fn decode_zones(data: &Value) -> Result<Vec<Zone>> {
    view_elements(data)?
        .into_iter()
        .map(|(view, elem)| Ok(Zone::new(view, coerce::to_string(field(elem, "n")?)?)))
        .collect()
}

/// Decode a record listing payload
///
/// A missing TTL (`l`) is treated as 0; name, type and data are required.
pub fn decode_records(data: &Value) -> Result<Vec<Record>> {
    view_elements(data)?
        .into_iter()
        .map(|(view, elem)| {
            let name = coerce::to_string(field(elem, "n")?)?;
            let ttl = match elem.get("l") {
                Some(l) => {
                    let ttl = coerce::to_int(l)?;
                    u32::try_from(ttl)
                        .map_err(|_| Error::parse(format!("TTL out of range for {}: {}", name, ttl)))?
                }
                None => 0,
            };
            Ok(Record {
                view,
                record_type: coerce::to_string(field(elem, "t")?)?,
                values: coerce::to_strings(field(elem, "d")?)?,
                ttl,
                name,
            })
        })
        .collect()
}
