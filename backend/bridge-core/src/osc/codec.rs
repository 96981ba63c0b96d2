//! OSC 1.0 datagram encoding and decoding.
//!
//! Every field is big-endian and padded to a 4-byte boundary. Strings are
//! NUL-terminated before padding. Bundles are accepted on decode and flattened
//! into their messages in order; the bridge never sends bundles.

use super::message::{ControlMessage, OscArg};
use crate::error::osc::OscError;

const BUNDLE_TAG: &str = "#bundle";
const TIMETAG_LEN: usize = 8;
const MAX_BUNDLE_DEPTH: usize = 8;

/// Encode one message into a datagram.
///
/// # Errors
///
/// Returns [`OscError::Encode`] if the address does not start with `/` or a
/// string contains an interior NUL.
pub fn encode_message(message: &ControlMessage) -> Result<Vec<u8>, OscError> {
    if !message.address.starts_with('/') {
        return Err(OscError::encode(format!(
            "OSC address must start with '/': {:?}",
            message.address
        )));
    }

    let mut buf = Vec::with_capacity(message.address.len() + 8 + message.args.len() * 8);
    write_str(&mut buf, &message.address)?;

    let type_tags: String = std::iter::once(',')
        .chain(message.args.iter().map(OscArg::tag))
        .collect();
    write_str(&mut buf, &type_tags)?;

    for arg in &message.args {
        match arg {
            OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Long(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Double(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::String(v) => write_str(&mut buf, v)?,
            OscArg::Blob(v) => write_blob(&mut buf, v)?,
            OscArg::True | OscArg::False | OscArg::Nil => {}
        }
    }

    Ok(buf)
}

/// Decode a datagram into the messages it carries.
///
/// # Errors
///
/// Returns [`OscError::Decode`] for truncated data, bad padding, unknown type
/// tags or bundles nested too deep.
pub fn decode_packet(data: &[u8]) -> Result<Vec<ControlMessage>, OscError> {
    let mut messages = Vec::new();
    decode_into(data, 0, &mut messages)?;
    Ok(messages)
}

fn decode_into(
    data: &[u8],
    depth: usize,
    messages: &mut Vec<ControlMessage>,
) -> Result<(), OscError> {
    match data.first() {
        Some(b'/') => {
            messages.push(decode_message(data)?);
            Ok(())
        }
        Some(b'#') => decode_bundle(data, depth, messages),
        Some(other) => Err(OscError::decode(format!(
            "Packet starts with unexpected byte 0x{other:02x}"
        ))),
        None => Err(OscError::decode("Empty packet")),
    }
}

fn decode_bundle(
    data: &[u8],
    depth: usize,
    messages: &mut Vec<ControlMessage>,
) -> Result<(), OscError> {
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(OscError::decode(format!(
            "Bundles nested deeper than {MAX_BUNDLE_DEPTH}"
        )));
    }

    let mut reader = Reader::new(data);
    let tag = reader.read_str()?;
    if tag != BUNDLE_TAG {
        return Err(OscError::decode(format!("Expected {BUNDLE_TAG}, got {tag:?}")));
    }
    // Timetag is ignored: every element is delivered immediately.
    let _ = reader.take(TIMETAG_LEN)?;

    while !reader.is_empty() {
        let size = reader.read_i32()?;
        let size = usize::try_from(size)
            .map_err(|_| OscError::decode(format!("Negative bundle element size {size}")))?;
        let element = reader.take(size)?;
        decode_into(element, depth + 1, messages)?;
    }
    Ok(())
}

fn decode_message(data: &[u8]) -> Result<ControlMessage, OscError> {
    let mut reader = Reader::new(data);
    let address = reader.read_str()?.to_string();

    // Type tags are optional in old implementations; no tags means no args.
    if reader.is_empty() {
        return Ok(ControlMessage::query(address));
    }

    let tags = reader.read_str()?;
    let Some(tags) = tags.strip_prefix(',') else {
        return Err(OscError::decode(format!(
            "Type tag string must start with ',': {tags:?}"
        )));
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(reader.read_i32()?),
            'h' => OscArg::Long(i64::from_be_bytes(reader.read_array()?)),
            'f' => OscArg::Float(f32::from_be_bytes(reader.read_array()?)),
            'd' => OscArg::Double(f64::from_be_bytes(reader.read_array()?)),
            's' | 'S' => OscArg::String(reader.read_str()?.to_string()),
            'b' => OscArg::Blob(reader.read_blob()?.to_vec()),
            'T' => OscArg::True,
            'F' => OscArg::False,
            'N' | 'I' => OscArg::Nil,
            other => {
                return Err(OscError::decode(format!(
                    "Unsupported type tag '{other}' in {address}"
                )));
            }
        };
        args.push(arg);
    }

    Ok(ControlMessage { address, args })
}

fn write_str(buf: &mut Vec<u8>, value: &str) -> Result<(), OscError> {
    if value.contains('\0') {
        return Err(OscError::encode(format!(
            "OSC string contains NUL: {value:?}"
        )));
    }
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
    pad(buf);
    Ok(())
}

fn write_blob(buf: &mut Vec<u8>, value: &[u8]) -> Result<(), OscError> {
    let len = i32::try_from(value.len())
        .map_err(|_| OscError::encode(format!("Blob too large: {} bytes", value.len())))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(value);
    pad(buf);
    Ok(())
}

fn pad(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

fn padded_len(len: usize) -> usize {
    (len + 3) & !3
}

/// Cursor over a datagram.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], OscError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                OscError::decode(format!(
                    "Truncated packet: need {len} bytes at offset {}, have {}",
                    self.pos,
                    self.data.len().saturating_sub(self.pos)
                ))
            })?;
        let data = self.data;
        let slice = &data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], OscError> {
        let slice = self.take(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(slice);
        Ok(bytes)
    }

    fn read_i32(&mut self) -> Result<i32, OscError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_str(&mut self) -> Result<&'a str, OscError> {
        let data = self.data;
        let rest = &data[self.pos.min(data.len())..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| OscError::decode("Unterminated OSC string"))?;
        let raw = self.take(padded_len(nul + 1))?;
        std::str::from_utf8(&raw[..nul])
            .map_err(|e| OscError::decode(format!("OSC string is not UTF-8: {e}")))
    }

    fn read_blob(&mut self) -> Result<&'a [u8], OscError> {
        let len = self.read_i32()?;
        let len = usize::try_from(len)
            .map_err(|_| OscError::decode(format!("Negative blob length {len}")))?;
        let raw = self.take(padded_len(len))?;
        Ok(&raw[..len])
    }
}
