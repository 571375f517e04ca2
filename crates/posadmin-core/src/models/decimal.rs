//! Serde helpers for Django `DecimalField` values.
//!
//! The backend renders decimals as strings (`"1250.50"`) but accepts numbers
//! too. We read either form into `f64` and write two-decimal strings.

use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Number(f64),
    Text(String),
}

fn parse<E: de::Error>(raw: Raw) -> Result<f64, E> {
    match raw {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| E::invalid_value(Unexpected::Str(&s), &"a decimal amount")),
    }
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    parse(Raw::deserialize(deserializer)?)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Option::<Raw>::deserialize(deserializer)?.map(parse).transpose()
    }
}
