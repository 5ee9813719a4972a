//! Signature cipher decompiler
//!
//! Protected stream formats carry a scrambled signature that the player
//! descrambles in JavaScript before use. The descrambling function is a short
//! sequence of calls into a helper object defining three primitive array
//! transforms (reverse, swap with a computed index, drop N leading elements);
//! both the function and helper names rotate with every player release.
//!
//! [`Cipher::from_js`] recovers that sequence from a player script body once,
//! after which [`Cipher::decode`] replays it against any signature belonging
//! to the same script version. Recovery is the expensive part — resolved
//! programs are kept in a [`crate::cache::CipherCache`] keyed by script URL.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{LivetubeError, Result};

/// One primitive transform of the descrambling program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformOp {
    /// Reverse the whole buffer
    Reverse,
    /// Drop the first `n` characters
    Splice(usize),
    /// Swap the first character with the one at `n % len`
    Swap(usize),
}

/// Anchors that locate the name of the descrambling function. Ordered from
/// most to least specific; the player rotates between these shapes.
static INITIAL_FUNCTION_ANCHORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"\b[cs]\s*&&\s*[adf]\.set\([^,]+\s*,\s*encodeURIComponent\s*\(\s*([a-zA-Z0-9$]+)\("#,
        r#"\b[a-zA-Z0-9]+\s*&&\s*[a-zA-Z0-9]+\.set\([^,]+\s*,\s*encodeURIComponent\s*\(\s*([a-zA-Z0-9$]+)\("#,
        r#"\bm=([a-zA-Z0-9$]{2})\(decodeURIComponent\(h\.s\)\)"#,
        r#"\bc&&\(c=([a-zA-Z0-9$]{2})\(decodeURIComponent\(c\)\)"#,
        r#"([a-zA-Z0-9$]+)\s*=\s*function\(\s*a\s*\)\s*\{\s*a\s*=\s*a\.split\(\s*""\s*\)"#,
        r#"\.sig\|\|([a-zA-Z0-9$]+)\("#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid anchor regex"))
    .collect()
});

static PLAN_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9$_]+\.([a-zA-Z0-9$_]+)\(\w+,(\d+)\)").expect("valid step regex")
});

static HELPER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z0-9$_]+)\.").expect("valid helper regex"));

/// A recovered descrambling program
///
/// Immutable and deterministic: the same ciphered input always yields the
/// same output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cipher {
    ops: Vec<TransformOp>,
}

impl Cipher {
    /// Decompiles the descrambling program from a player script body
    ///
    /// # Arguments
    /// * `js` - Full text of the player script asset
    ///
    /// # Errors
    /// - `RegexMatchError` when the descrambling function cannot be located
    /// - `ParseError` when the function body or helper object has an
    ///   unrecognized shape
    pub fn from_js(js: &str) -> Result<Self> {
        let name = initial_function_name(js)?;
        let plan = transform_plan(js, &name)?;

        let first_step = plan.first().ok_or_else(|| {
            LivetubeError::ParseError("empty transform plan".to_string())
        })?;
        let helper = HELPER_NAME
            .captures(first_step)
            .and_then(|caps| caps.get(1))
            .ok_or_else(|| {
                LivetubeError::ParseError(format!("no helper reference in step {first_step}"))
            })?
            .as_str();
        let map = transform_map(js, helper)?;

        let mut ops = Vec::with_capacity(plan.len());
        for step in &plan {
            let caps = PLAN_STEP.captures(step).ok_or_else(|| {
                LivetubeError::ParseError(format!("unparseable transform step {step}"))
            })?;
            let fn_name = &caps[1];
            let argument: usize = caps[2].parse().map_err(|_| {
                LivetubeError::ParseError(format!("bad transform argument in {step}"))
            })?;

            let op = match lookup(&map, fn_name) {
                Some(OpKind::Reverse) => TransformOp::Reverse,
                Some(OpKind::Splice) => TransformOp::Splice(argument),
                Some(OpKind::Swap) => TransformOp::Swap(argument),
                None => {
                    return Err(LivetubeError::ParseError(format!(
                        "transform function {fn_name} not found in helper {helper}"
                    )));
                }
            };
            ops.push(op);
        }

        debug!(function = %name, steps = ops.len(), "decompiled cipher program");
        Ok(Self { ops })
    }

    /// Applies the program to a ciphered signature
    ///
    /// Pure function of the input string and the already-resolved program.
    pub fn decode(&self, ciphered: &str) -> String {
        let mut buffer: Vec<char> = ciphered.chars().collect();
        for op in &self.ops {
            match op {
                TransformOp::Reverse => buffer.reverse(),
                TransformOp::Splice(n) => {
                    buffer.drain(..(*n).min(buffer.len()));
                }
                TransformOp::Swap(n) => {
                    if !buffer.is_empty() {
                        let j = n % buffer.len();
                        buffer.swap(0, j);
                    }
                }
            }
        }
        buffer.into_iter().collect()
    }

    /// Number of transform steps in the program
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when the program carries no steps
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_ops(ops: Vec<TransformOp>) -> Self {
        Self { ops }
    }
}

enum OpKind {
    Reverse,
    Splice,
    Swap,
}

fn initial_function_name(js: &str) -> Result<String> {
    for anchor in INITIAL_FUNCTION_ANCHORS.iter() {
        if let Some(caps) = anchor.captures(js)
            && let Some(name) = caps.get(1)
        {
            return Ok(name.as_str().to_string());
        }
    }
    Err(LivetubeError::regex_match(
        "initial_function_name",
        "multiple known function anchors",
    ))
}

/// Extracts the body of the descrambling function as one call per step,
/// e.g. `["DE.pw(a,2)", "DE.VR(a,3)", "DE.AJ(a,1)"]`
fn transform_plan(js: &str, name: &str) -> Result<Vec<String>> {
    let pattern = format!(
        r#"{}=function\(\w\)\{{[a-z=\.\("\)]*;(.*);(?:.+)\}}"#,
        regex::escape(name)
    );
    let plan_regex = Regex::new(&pattern)
        .map_err(|e| LivetubeError::ParseError(format!("bad plan pattern: {e}")))?;

    let caps = plan_regex
        .captures(js)
        .ok_or_else(|| LivetubeError::regex_match("transform_plan", &pattern))?;

    Ok(caps[1].split(';').map(|s| s.to_string()).collect())
}

/// Resolves the helper object body into a name → primitive mapping
fn transform_map(js: &str, helper: &str) -> Result<Vec<(String, OpKind)>> {
    let pattern = format!(r"(?s)var\s+{}=\{{(.*?)\}}\s*;", regex::escape(helper));
    let object_regex = Regex::new(&pattern)
        .map_err(|e| LivetubeError::ParseError(format!("bad helper pattern: {e}")))?;

    let caps = object_regex
        .captures(js)
        .ok_or_else(|| LivetubeError::regex_match("transform_map", &pattern))?;

    let mut map = Vec::new();
    for entry in caps[1].split("},") {
        let Some((fn_name, body)) = entry.split_once(':') else {
            continue;
        };
        let kind = if body.contains("reverse") {
            OpKind::Reverse
        } else if body.contains("splice") {
            OpKind::Splice
        } else if body.contains('%') {
            OpKind::Swap
        } else {
            return Err(LivetubeError::ParseError(format!(
                "unrecognized transform body for {}",
                fn_name.trim()
            )));
        };
        map.push((fn_name.trim().to_string(), kind));
    }

    if map.is_empty() {
        return Err(LivetubeError::ParseError(
            "cipher not found: empty helper object".to_string(),
        ));
    }
    Ok(map)
}

fn lookup<'a>(map: &'a [(String, OpKind)], name: &str) -> Option<&'a OpKind> {
    map.iter()
        .find(|(entry, _)| entry == name)
        .map(|(_, kind)| kind)
}
