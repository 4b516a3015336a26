//! # Source Records
//!
//! The shape a parsing layer hands over for one scan file. Every field is optional
//! or loosely typed because the formats that feed it disagree on what they carry;
//! nothing here has been validated yet.
//!
//! Decoding is lenient per element. A host or port entry that does not fit the
//! record shape is kept as a placeholder carrying the decode error, so the
//! normalizer can report it as a skipped record while the rest of the file
//! survives.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// All hosts decoded from one input file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceScan {
    /// Identifier used as the provenance tag (usually the file path).
    #[serde(default)]
    pub source: String,
    /// Command line that produced the scan, when the format records it.
    #[serde(default, deserialize_with = "loose_text")]
    pub command: Option<String>,
    #[serde(default, deserialize_with = "lenient_hosts")]
    pub hosts: Vec<RawHost>,
}

impl SourceScan {
    pub fn new(source: impl Into<String>, hosts: Vec<RawHost>) -> Self {
        Self {
            source: source.into(),
            command: None,
            hosts,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHost {
    #[serde(default, deserialize_with = "loose_text")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub hostnames: Vec<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub status: Option<String>,
    /// A fingerprint that does not decode is dropped; the host stays.
    #[serde(default, deserialize_with = "lenient_os")]
    pub os: Option<RawOs>,
    #[serde(default, deserialize_with = "lenient_ports")]
    pub ports: Vec<RawPort>,
    /// Host-level script output (not bound to a port).
    #[serde(default, deserialize_with = "lenient_scripts")]
    pub scripts: Vec<RawScript>,
    /// Decode error when the entry did not fit this shape at all.
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl RawHost {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            malformed: Some(reason.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOs {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub accuracy: Option<RawNumber>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPort {
    #[serde(default)]
    pub port: Option<RawNumber>,
    #[serde(default, deserialize_with = "loose_text")]
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub state: Option<String>,
    #[serde(default)]
    pub service: Option<RawService>,
    #[serde(default, deserialize_with = "lenient_scripts")]
    pub scripts: Vec<RawScript>,
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl RawPort {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            malformed: Some(reason.into()),
            ..Default::default()
        }
    }
}

/// Greppable output yields text, XML attributes are text, JSON exports use numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(i64),
    Text(String),
}

impl RawNumber {
    /// Integer value, accepting numeric text such as `"98"` or `" 22 "`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawNumber::Number(n) => Some(*n),
            RawNumber::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<u16> for RawNumber {
    fn from(port: u16) -> Self {
        RawNumber::Number(i64::from(port))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawService {
    #[serde(default, deserialize_with = "loose_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub version: Option<String>,
    #[serde(default, alias = "extrainfo", deserialize_with = "loose_text")]
    pub extra_info: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScript {
    #[serde(default, deserialize_with = "loose_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "loose_text")]
    pub output: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Integer(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Text field that also takes numbers and booleans (`"version": 2`).
fn loose_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(one)) => vec![one.into_text()],
        Some(OneOrMany::Many(many)) => many.into_iter().map(Scalar::into_text).collect(),
    })
}

/// Decodes a JSON array element by element; `fallback` turns a failure into a
/// placeholder. `null` is an empty list and a lone value a list of one.
fn lenient_seq<'de, D, T>(
    deserializer: D,
    fallback: impl Fn(serde_json::Error) -> Option<T>,
) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => vec![other],
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).map_or_else(&fallback, Some))
        .collect())
}

/// Hosts decoded one at a time, failures kept as [`RawHost::malformed`].
pub fn lenient_hosts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RawHost>, D::Error> {
    lenient_seq(deserializer, |e| Some(RawHost::malformed(e.to_string())))
}

fn lenient_ports<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RawPort>, D::Error> {
    lenient_seq(deserializer, |e| Some(RawPort::malformed(e.to_string())))
}

fn lenient_os<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<RawOs>, D::Error> {
    let Some(value) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(serde_json::from_value(value)
        .map_err(|e| debug!("Dropping undecodable OS fingerprint: {e}"))
        .ok()
        .flatten())
}

fn lenient_scripts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RawScript>, D::Error> {
    lenient_seq(deserializer, |e| {
        debug!("Dropping undecodable script entry: {e}");
        None
    })
}
