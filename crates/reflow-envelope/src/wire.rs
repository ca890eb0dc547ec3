//! Wire JSON for the response envelope.
//!
//! Body shape:
//!
//! ```json
//! {
//!   "metadata": {},
//!   "payload": { "html": { "key": "<markup>" }, "data": {} },
//!   "error": { "application": [], "exception": [] }
//! }
//! ```
//!
//! The `html` object preserves fragment compile order in both directions;
//! `hasErrors` is internal state and never appears on the wire.

use serde::de::{MapAccess, Visitor};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::envelope::ResponseEnvelope;
use crate::error::EnvelopeError;

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut root = serializer.serialize_struct("ResponseEnvelope", 3)?;
        root.serialize_field("metadata", &self.metadata)?;
        root.serialize_field(
            "payload",
            &PayloadRef {
                html: &self.html,
                data: &self.data,
            },
        )?;
        root.serialize_field(
            "error",
            &ErrorRef {
                application: &self.application_errors,
                exception: &self.system_errors,
            },
        )?;
        root.end()
    }
}

struct PayloadRef<'a> {
    html: &'a [(String, String)],
    data: &'a Value,
}

impl Serialize for PayloadRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut payload = serializer.serialize_struct("payload", 2)?;
        payload.serialize_field("html", &OrderedMapRef(self.html))?;
        payload.serialize_field("data", self.data)?;
        payload.end()
    }
}

struct OrderedMapRef<'a>(&'a [(String, String)]);

impl Serialize for OrderedMapRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, html) in self.0 {
            map.serialize_entry(key, html)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct ErrorRef<'a> {
    application: &'a [String],
    exception: &'a [String],
}

#[derive(Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    metadata: Value,
    #[serde(default)]
    payload: WirePayload,
    #[serde(default)]
    error: WireErrors,
}

#[derive(Deserialize, Default)]
struct WirePayload {
    #[serde(default, deserialize_with = "ordered_map")]
    html: Vec<(String, String)>,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize, Default)]
struct WireErrors {
    #[serde(default)]
    application: Vec<String>,
    #[serde(default)]
    exception: Vec<String>,
}

fn ordered_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<(String, String)>, D::Error> {
    struct OrderedMapVisitor;

    impl<'de> Visitor<'de> for OrderedMapVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a map of fragment keys to HTML strings")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut pairs = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, html)) = access.next_entry::<String, String>()? {
                pairs.push((key, html));
            }
            Ok(pairs)
        }
    }

    deserializer.deserialize_map(OrderedMapVisitor)
}

pub(crate) fn parse(body: &str) -> Result<ResponseEnvelope, EnvelopeError> {
    let wire: WireEnvelope =
        serde_json::from_str(body).map_err(|e| EnvelopeError::Parse(e.to_string()))?;
    let has_errors = !wire.error.application.is_empty() || !wire.error.exception.is_empty();
    Ok(ResponseEnvelope {
        metadata: wire.metadata,
        html: wire.payload.html,
        data: wire.payload.data,
        application_errors: wire.error.application,
        system_errors: wire.error.exception,
        has_errors,
    })
}
