//! OSC message model shared by the UDP side and the WebSocket side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One OSC message: an address pattern and its ordered arguments.
///
/// Same shape in both directions, so a client `osc` frame and an inbound
/// datagram produce the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub address: String,
    #[serde(default)]
    pub args: Vec<OscArg>,
}

impl ControlMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// A message with no arguments, which the control surface treats as a query.
    pub fn query(address: impl Into<String>) -> Self {
        Self::new(address, Vec::new())
    }
}

/// A single OSC argument.
///
/// On the WebSocket it is `{"type": "<tag>", "value": <v>}`; bare JSON
/// primitives are also accepted from clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ArgRepr", into = "TaggedArg")]
pub enum OscArg {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Blob(Vec<u8>),
    True,
    False,
    Nil,
}

impl OscArg {
    /// OSC type tag character.
    pub fn tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Long(_) => 'h',
            OscArg::Float(_) => 'f',
            OscArg::Double(_) => 'd',
            OscArg::String(_) => 's',
            OscArg::Blob(_) => 'b',
            OscArg::True => 'T',
            OscArg::False => 'F',
            OscArg::Nil => 'N',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaggedArg {
    #[serde(rename = "type")]
    tag: String,
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArgRepr {
    Tagged(TaggedArg),
    Bare(Value),
}

impl From<OscArg> for TaggedArg {
    fn from(arg: OscArg) -> Self {
        let tag = arg.tag().to_string();
        let value = match arg {
            OscArg::Int(v) => Value::from(v),
            OscArg::Long(v) => Value::from(v),
            OscArg::Float(v) => Value::from(f64::from(v)),
            OscArg::Double(v) => Value::from(v),
            OscArg::String(v) => Value::from(v),
            OscArg::Blob(v) => Value::from(v),
            OscArg::True => Value::Bool(true),
            OscArg::False => Value::Bool(false),
            OscArg::Nil => Value::Null,
        };
        TaggedArg { tag, value }
    }
}

impl TryFrom<ArgRepr> for OscArg {
    type Error = String;

    fn try_from(repr: ArgRepr) -> Result<Self, Self::Error> {
        match repr {
            ArgRepr::Tagged(tagged) => from_tagged(tagged),
            ArgRepr::Bare(value) => from_bare(value),
        }
    }
}

fn from_tagged(TaggedArg { tag, value }: TaggedArg) -> Result<OscArg, String> {
    let mismatch = || format!("OSC arg of type '{tag}' has incompatible value {value}");
    match tag.as_str() {
        "i" => value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(OscArg::Int)
            .ok_or_else(mismatch),
        "h" => value.as_i64().map(OscArg::Long).ok_or_else(mismatch),
        "f" => value.as_f64().map(|v| OscArg::Float(v as f32)).ok_or_else(mismatch),
        "d" => value.as_f64().map(OscArg::Double).ok_or_else(mismatch),
        "s" | "S" => value
            .as_str()
            .map(|v| OscArg::String(v.to_string()))
            .ok_or_else(mismatch),
        "b" => serde_json::from_value::<Vec<u8>>(value.clone())
            .map(OscArg::Blob)
            .map_err(|_| mismatch()),
        "T" => Ok(OscArg::True),
        "F" => Ok(OscArg::False),
        "N" | "I" => Ok(OscArg::Nil),
        other => Err(format!("Unsupported OSC arg type '{other}'")),
    }
}

fn from_bare(value: Value) -> Result<OscArg, String> {
    match value {
        Value::Null => Ok(OscArg::Nil),
        Value::Bool(true) => Ok(OscArg::True),
        Value::Bool(false) => Ok(OscArg::False),
        Value::String(s) => Ok(OscArg::String(s)),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(i32::try_from(v).map_or(OscArg::Long(v), OscArg::Int))
            } else {
                n.as_f64()
                    .map(|v| OscArg::Float(v as f32))
                    .ok_or_else(|| format!("Unrepresentable OSC number {n}"))
            }
        }
        other => Err(format!("Unsupported OSC arg {other}")),
    }
}
