//! Parsing of the scripting host's answer lines.
//!
//! ```text
//! P,<track>,<fx>,<param>,<value>   parameter value (track field unused)
//! E,<track>,<fx>,<flag>            enabled flag; "0" means bypassed
//! S,<track>,<send>,<volume>        send level
//! ```

use crate::message::{FxParamValue, SendValue};

use std::collections::BTreeMap;

use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseRecord {
    Param {
        track_idx: Option<i32>,
        fx_idx: i32,
        param_idx: i32,
        value: f64,
    },
    Enabled {
        track_idx: Option<i32>,
        fx_idx: i32,
        raw_flag: String,
    },
    Send {
        track_idx: i32,
        send_idx: i32,
        volume: f64,
    },
}

impl ResponseRecord {
    /// Parse one line. Fields are trimmed; extra trailing fields are ignored.
    pub fn parse_line(line: &str) -> Result<Self, String> {
        let parts: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        match parts.first().copied() {
            Some("P") => Ok(ResponseRecord::Param {
                track_idx: parts.get(1).and_then(|v| v.parse().ok()),
                fx_idx: field(&parts, 2, "fxIdx")?,
                param_idx: field(&parts, 3, "paramIdx")?,
                value: field(&parts, 4, "value")?,
            }),
            Some("E") => Ok(ResponseRecord::Enabled {
                track_idx: parts.get(1).and_then(|v| v.parse().ok()),
                fx_idx: field(&parts, 2, "fxIdx")?,
                raw_flag: parts
                    .get(3)
                    .map(|v| (*v).to_string())
                    .ok_or_else(|| "missing enabled flag".to_string())?,
            }),
            Some("S") => Ok(ResponseRecord::Send {
                track_idx: field(&parts, 1, "trackIdx")?,
                send_idx: field(&parts, 2, "sendIdx")?,
                volume: field(&parts, 3, "volume")?,
            }),
            Some(tag) => Err(format!("unknown tag {tag:?}")),
            None => Err("empty line".to_string()),
        }
    }

    /// Whether an `E` record means the effect is bypassed.
    ///
    /// The host reports *enabled*; flag `0` is disabled, which clients show as
    /// bypassed. Any other flag value is not bypassed.
    pub fn is_bypassed(raw_flag: &str) -> bool {
        raw_flag == "0"
    }
}

fn field<T: std::str::FromStr>(parts: &[&str], index: usize, name: &str) -> Result<T, String> {
    let raw = parts
        .get(index)
        .ok_or_else(|| format!("missing {name}"))?;
    raw.parse()
        .map_err(|_| format!("invalid {name} {raw:?}"))
}

/// Every usable record in one answer, grouped the way clients consume them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSet {
    /// Parameter values in answer order.
    pub params: Vec<FxParamValue>,
    /// Bypass state by effect slot; a later line for the same slot wins.
    pub bypassed: BTreeMap<i32, bool>,
    /// Send levels by track, each in answer order.
    pub sends: BTreeMap<i32, Vec<SendValue>>,
    /// Lines that did not parse.
    pub skipped: usize,
}

impl ResponseSet {
    pub fn parse(content: &str) -> Self {
        let mut set = ResponseSet::default();

        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            match ResponseRecord::parse_line(line) {
                Ok(record) => set.push(record),
                Err(reason) => {
                    debug!("Skipping response line {line:?}: {reason}");
                    set.skipped += 1;
                }
            }
        }

        set
    }

    pub fn push(&mut self, record: ResponseRecord) {
        match record {
            ResponseRecord::Param {
                fx_idx,
                param_idx,
                value,
                ..
            } => self.params.push(FxParamValue {
                fx_idx,
                param_idx,
                value,
            }),
            ResponseRecord::Enabled {
                fx_idx, raw_flag, ..
            } => {
                let _ = self
                    .bypassed
                    .insert(fx_idx, ResponseRecord::is_bypassed(&raw_flag));
            }
            ResponseRecord::Send {
                track_idx,
                send_idx,
                volume,
            } => self.sends.entry(track_idx).or_default().push(SendValue {
                send_idx,
                vol: volume,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.bypassed.is_empty() && self.sends.is_empty()
    }
}

/// Decide whether the response file holds an answer.
///
/// The answer is every complete (newline-terminated) line. A trailing line
/// without its newline may still be mid-write and is left out. Content with
/// no non-blank complete line is not an answer.
pub fn ready_answer(content: &str) -> Option<&str> {
    let end = content.rfind('\n')?;
    let complete = &content[..=end];
    if complete.trim().is_empty() {
        None
    } else {
        Some(complete)
    }
}
