//! HTTP request/response models for the gateway's public REST API.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// `retCode` for a completed analysis, including the "nothing found" case.
pub const RET_CODE_OK: i64 = 0;

/// `retCode` shared by every failure class.
pub const RET_CODE_FAILURE: i64 = 999_999;

// ------------------------------------------------------------------ //
//  Inbound (client → gateway)                                         //
// ------------------------------------------------------------------ //

/// Raw `port` value of a descriptor, kept in the form it was received.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PortField {
    Number(Number),
    Text(String),
    /// Field absent or `null`.
    #[default]
    Missing,
    /// Booleans, arrays and objects.
    Unsupported(Value),
}

impl PortField {
    /// Coerce to a TCP port in `1..=65535`.
    ///
    /// Numbers are tried first, with fractional values truncated toward zero
    /// (`3306.5` is 3306, `0.5` is 0 and out of range); text falls back to
    /// base-10 integer parsing.
    pub fn as_port(&self) -> Option<u16> {
        match self {
            PortField::Number(n) => port_from_number(n),
            PortField::Text(s) => s.parse::<i64>().ok().and_then(port_in_range),
            PortField::Missing | PortField::Unsupported(_) => None,
        }
    }
}

fn port_from_number(n: &Number) -> Option<u16> {
    if let Some(i) = n.as_i64() {
        return port_in_range(i);
    }
    if n.is_u64() {
        return None;
    }
    let f = n.as_f64()?;
    if !f.is_finite() {
        return None;
    }
    let whole = f.trunc();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    port_in_range(whole as i64)
}

fn port_in_range(p: i64) -> Option<u16> {
    if (1..=65535).contains(&p) {
        Some(p as u16)
    } else {
        None
    }
}

impl From<Option<Value>> for PortField {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => PortField::Missing,
            Some(Value::Number(n)) => PortField::Number(n),
            Some(Value::String(s)) => PortField::Text(s),
            Some(other) => PortField::Unsupported(other),
        }
    }
}

impl<'de> Deserialize<'de> for PortField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<Value>::deserialize(deserializer).map(PortField::from)
    }
}

impl Serialize for PortField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PortField::Number(n) => n.serialize(serializer),
            PortField::Text(s) => serializer.serialize_str(s),
            PortField::Missing => serializer.serialize_none(),
            PortField::Unsupported(v) => v.serialize(serializer),
        }
    }
}

/// One database the analyzer should inspect.
///
/// `url` and `database` are optional at the type level so that a record
/// missing them is reported by validation with its index, not rejected as
/// malformed JSON.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    /// Host address of the database server.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub port: PortField,
    #[serde(default)]
    pub database: Option<String>,
    /// Pre-built connection string, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_url: Option<String>,
}

// ------------------------------------------------------------------ //
//  Outbound (gateway → client)                                        //
// ------------------------------------------------------------------ //

/// Uniform body returned for every `/processlist` outcome.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub exist_slow_sql: bool,
    pub ret_code: i64,
    pub ret_msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_slow_sql_list: Option<Value>,
}

impl ResponseEnvelope {
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            exist_slow_sql: false,
            ret_code: RET_CODE_FAILURE,
            ret_msg: msg.into(),
            root_cause_slow_sql_list: None,
        }
    }

    /// The analyzer ran but found nothing. Shares `RET_CODE_OK` with success;
    /// callers tell the two apart through `exist_slow_sql`.
    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            exist_slow_sql: false,
            ret_code: RET_CODE_OK,
            ret_msg: msg.into(),
            root_cause_slow_sql_list: None,
        }
    }

    pub fn success(findings: Value) -> Self {
        Self {
            exist_slow_sql: true,
            ret_code: RET_CODE_OK,
            ret_msg: "success".to_string(),
            root_cause_slow_sql_list: Some(findings),
        }
    }
}

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //
