//! Serializer contract and the serde_json-backed default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Converts values to and from JSON text.
///
/// The service routes every payload through the injected serializer, GET
/// query parameters included, so whatever output rules an implementation
/// applies (field naming, null handling) reach the wire consistently.
pub trait Serializer {
    type Error: std::error::Error + Send + Sync + 'static;

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, Self::Error>;

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, Self::Error>;
}

impl<S: Serializer + ?Sized> Serializer for &S {
    type Error = S::Error;

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, Self::Error> {
        (**self).serialize(value)
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, Self::Error> {
        (**self).deserialize(text)
    }
}

/// `Serializer` over serde_json.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonSerializer {
    pretty: bool,
    omit_nulls: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-print serialized output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Drop `null` object members, at any depth, from serialized output.
    /// Array elements are left alone.
    pub fn omit_nulls(mut self, omit_nulls: bool) -> Self {
        self.omit_nulls = omit_nulls;
        self
    }
}

impl Serializer for JsonSerializer {
    type Error = serde_json::Error;

    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, Self::Error> {
        if self.omit_nulls {
            let mut value = serde_json::to_value(value)?;
            strip_nulls(&mut value);
            return self.write(&value);
        }
        self.write(value)
    }

    fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, Self::Error> {
        serde_json::from_str(text)
    }
}

impl JsonSerializer {
    fn write<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}
