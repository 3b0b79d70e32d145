//! Cipher decoding and sigil unlocking.
//!
//! Two ciphers exist in the drift: rot13 notes and base64 manifests. Decoding
//! is pure; the sigil scan afterwards is the only part that touches player
//! state, and each sigil flag can fire exactly once per run.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use tracing::debug;

use game_world::PlayerState;

/// Decode failures, each displaying as its player-facing one-liner.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("Unknown cipher. Use rot13 or b64.")]
    UnknownCipher(String),

    #[error("No cached cipher. Read a cipher file first.")]
    NoCachedCipher,

    #[error("Base64 decode failed.")]
    BadBase64(#[source] base64::DecodeError),
}

/// The cipher families the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherKind {
    Rot13,
    Base64,
}

impl CipherKind {
    /// Resolve a cipher name, accepting the shorthand aliases players type.
    pub fn from_name(name: &str) -> Result<Self, CipherError> {
        match name.to_ascii_lowercase().as_str() {
            "rot13" | "rot" | "r13" => Ok(CipherKind::Rot13),
            "b64" | "base64" => Ok(CipherKind::Base64),
            other => Err(CipherError::UnknownCipher(other.to_string())),
        }
    }
}

/// Classic 13-position rotation over ASCII letters, case-preserving.
/// Everything else passes through, so the function is its own inverse.
pub fn rot13(text: &str) -> String {
    fn rotate(c: char, base: u8) -> char {
        (((c as u8 - base + 13) % 26) + base) as char
    }

    text.chars()
        .map(|c| match c {
            'a'..='z' => rotate(c, b'a'),
            'A'..='Z' => rotate(c, b'A'),
            _ => c,
        })
        .collect()
}

/// Decode a payload, falling back to the last cipher the player read.
///
/// Base64 decoding is strict: malformed input is an error, never partial
/// output. Decoded bytes are read as UTF-8 with lossy replacement.
pub fn decode(
    kind: CipherKind,
    payload: Option<&str>,
    cached: Option<&str>,
) -> Result<String, CipherError> {
    let payload = payload.or(cached).ok_or(CipherError::NoCachedCipher)?;
    match kind {
        CipherKind::Rot13 => Ok(rot13(payload)),
        CipherKind::Base64 => {
            let raw = STANDARD.decode(payload).map_err(CipherError::BadBase64)?;
            Ok(String::from_utf8_lossy(&raw).into_owned())
        }
    }
}

/// Sigil phrases hidden in decoded text: substring, flag, log line.
const SIGIL_TRIGGERS: &[(&str, &str, &str)] = &[
    ("EMBER", "ember_phrase", "Decoded ember phrase"),
    ("LATTICE", "lattice_sigil", "Decoded lattice sigil"),
];

/// Scan decoded text for sigil phrases and raise their flags.
///
/// The scan is case-insensitive, each trigger fires at most once per run,
/// and multiple triggers may fire from the same decode. Returns the flags
/// that were newly raised.
pub fn unlock_sigils(state: &mut PlayerState, decoded: &str) -> Vec<&'static str> {
    let haystack = decoded.to_uppercase();
    let mut unlocked = Vec::new();
    for (needle, flag, event) in SIGIL_TRIGGERS {
        if haystack.contains(needle) && !state.has_flag(flag) {
            state.raise_flag(*flag);
            state.record(*event);
            debug!(flag, "sigil unlocked");
            unlocked.push(*flag);
        }
    }
    unlocked
}
