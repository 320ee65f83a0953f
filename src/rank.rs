//! RANK payloads carried in OP_RETURN outputs
//!
//! A RANK output records a positive or negative vote on a social-platform
//! profile (and optionally one post of that profile):
//!
//! ```text
//! OP_RETURN <"RANK"> <OP_0 | OP_1> <platform: 1 byte> <profile id> [<post id>]
//! ```
//!
//! `OP_0` is a negative vote, `OP_1` a positive one. The profile id and post
//! id lengths are fixed per platform.

use bitcoin::opcodes::all::{OP_PUSHNUM_1, OP_RETURN};
use bitcoin::script::Instruction;
use bitcoin::Script;
use serde::Serialize;

pub const LOKAD_PREFIX: &[u8; 4] = b"RANK";

pub type Result<T> = std::result::Result<T, RankError>;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    #[error("Output is not an OP_RETURN")]
    NotOpReturn,

    #[error("OP_RETURN does not carry the RANK prefix")]
    NotRank,

    #[error("Malformed RANK script: {0}")]
    Malformed(String),

    #[error("Unknown RANK platform 0x{0:02x}")]
    UnknownPlatform(u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Platform {
    name: &'static str,
    byte: u8,
    profile_id_len: usize,
    post_id_len: usize,
}

const PLATFORMS: &[Platform] = &[Platform {
    name: "twitter",
    byte: 0x01,
    profile_id_len: 16,
    post_id_len: 8,
}];

/// Decoded RANK vote
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankPayload {
    pub protocol: &'static str,
    pub sentiment: Sentiment,
    pub platform: &'static str,
    pub profile_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

/// Decode a RANK payload from an output script
pub fn decode(script: &Script) -> Result<RankPayload> {
    let mut instructions = script.instructions();

    match instructions.next() {
        Some(Ok(Instruction::Op(op))) if op == OP_RETURN => {}
        _ => return Err(RankError::NotOpReturn),
    }

    let mut pushes = Vec::new();
    for instruction in instructions {
        let instruction =
            instruction.map_err(|e| RankError::Malformed(format!("bad push: {}", e)))?;
        pushes.push(instruction);
    }

    let mut pushes = pushes.into_iter();

    match pushes.next() {
        Some(Instruction::PushBytes(bytes)) if bytes.as_bytes() == LOKAD_PREFIX => {}
        _ => return Err(RankError::NotRank),
    }

    let sentiment = match pushes.next() {
        Some(Instruction::PushBytes(bytes)) if bytes.is_empty() => Sentiment::Negative,
        Some(Instruction::Op(op)) if op == OP_PUSHNUM_1 => Sentiment::Positive,
        _ => return Err(RankError::Malformed("missing sentiment".to_string())),
    };

    let platform_byte = match pushes.next() {
        Some(Instruction::PushBytes(bytes)) if bytes.len() == 1 => bytes.as_bytes()[0],
        _ => return Err(RankError::Malformed("missing platform".to_string())),
    };
    let platform = PLATFORMS
        .iter()
        .find(|p| p.byte == platform_byte)
        .ok_or(RankError::UnknownPlatform(platform_byte))?;

    let profile_id = match pushes.next() {
        Some(Instruction::PushBytes(bytes)) if bytes.len() == platform.profile_id_len => {
            decode_profile_id(bytes.as_bytes())?
        }
        _ => {
            return Err(RankError::Malformed(format!(
                "profile id must be {} bytes",
                platform.profile_id_len
            )))
        }
    };

    let post_id = match pushes.next() {
        None => None,
        Some(Instruction::PushBytes(bytes)) if bytes.len() == platform.post_id_len => {
            Some(decode_post_id(bytes.as_bytes()))
        }
        Some(_) => {
            return Err(RankError::Malformed(format!(
                "post id must be {} bytes",
                platform.post_id_len
            )))
        }
    };

    if pushes.next().is_some() {
        return Err(RankError::Malformed("trailing data".to_string()));
    }

    Ok(RankPayload {
        protocol: "RANK",
        sentiment,
        platform: platform.name,
        profile_id,
        post_id,
    })
}

// Profile ids are UTF-8, left-padded with NUL bytes
fn decode_profile_id(bytes: &[u8]) -> Result<String> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let id = std::str::from_utf8(&bytes[start..])
        .map_err(|_| RankError::Malformed("profile id is not UTF-8".to_string()))?;
    if id.is_empty() {
        return Err(RankError::Malformed("empty profile id".to_string()));
    }
    Ok(id.to_string())
}

fn decode_post_id(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
        .to_string()
}
