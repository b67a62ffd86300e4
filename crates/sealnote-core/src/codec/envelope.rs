//! On-disk envelope record.
//!
//! One note file holds exactly one JSON object:
//!
//! ```text
//! {"iv":"<12 bytes hex>","content":"<ciphertext hex>","tag":"<16 bytes hex>"}
//! ```
//!
//! Field names, field order and lower-case hex are the compatibility surface.
//! The reader is strict: unknown, missing or duplicate fields, upper-case or
//! non-hex characters and wrong lengths are all rejected, so that a single
//! flipped bit anywhere in the record can never decode to a valid envelope
//! with the same meaning.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{NoteError, Result};

/// AES-GCM nonce length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// An encrypted note: nonce, ciphertext and detached authentication tag.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    nonce: [u8; NONCE_LENGTH],
    ciphertext: Vec<u8>,
    auth_tag: [u8; TAG_LENGTH],
}

/// Wire shape of the envelope.
#[derive(Serialize)]
struct EnvelopeRecord {
    iv: String,
    content: String,
    tag: String,
}

/// Field names in the only accepted order.
const FIELDS: [&str; 3] = ["iv", "content", "tag"];

impl<'de> Deserialize<'de> for EnvelopeRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = EnvelopeRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with fields iv, content, tag in that order")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
        let mut values: [String; 3] = Default::default();
        for (slot, expected) in values.iter_mut().zip(FIELDS) {
            match map.next_key::<String>()? {
                Some(key) if key == expected => *slot = map.next_value()?,
                Some(key) => {
                    return Err(de::Error::custom(format!(
                        "expected field '{}', found '{}'",
                        expected, key
                    )))
                }
                None => return Err(de::Error::missing_field(expected)),
            }
        }
        if let Some(key) = map.next_key::<String>()? {
            return Err(de::Error::custom(format!("unexpected field '{}'", key)));
        }
        let [iv, content, tag] = values;
        Ok(EnvelopeRecord { iv, content, tag })
    }
}

impl EncryptedEnvelope {
    /// Assemble an envelope from its three fields.
    pub fn from_parts(
        nonce: [u8; NONCE_LENGTH],
        ciphertext: Vec<u8>,
        auth_tag: [u8; TAG_LENGTH],
    ) -> Self {
        Self {
            nonce,
            ciphertext,
            auth_tag,
        }
    }

    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn auth_tag(&self) -> &[u8; TAG_LENGTH] {
        &self.auth_tag
    }

    /// Serialize to the on-disk JSON record.
    pub fn to_json(&self) -> String {
        let record = EnvelopeRecord {
            iv: hex::encode(self.nonce),
            content: hex::encode(&self.ciphertext),
            tag: hex::encode(self.auth_tag),
        };
        // Three plain string fields cannot fail to serialize.
        serde_json::to_string(&record).unwrap_or_default()
    }

    /// Serialize to bytes ready to be written to a note file.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().into_bytes()
    }

    /// Parse the on-disk JSON record.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::EnvelopeParse` for any deviation from the format.
    pub fn from_json(text: &str) -> Result<Self> {
        let record: EnvelopeRecord = serde_json::from_str(text)
            .map_err(|e| NoteError::EnvelopeParse(format!("invalid record: {}", e)))?;
        Self::from_record(record)
    }

    /// Parse raw note file bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let record: EnvelopeRecord = serde_json::from_slice(bytes)
            .map_err(|e| NoteError::EnvelopeParse(format!("invalid record: {}", e)))?;
        Self::from_record(record)
    }

    fn from_record(record: EnvelopeRecord) -> Result<Self> {
        let nonce = decode_fixed::<NONCE_LENGTH>("iv", &record.iv)?;
        let ciphertext = decode_lower_hex("content", &record.content)?;
        let auth_tag = decode_fixed::<TAG_LENGTH>("tag", &record.tag)?;
        Ok(Self {
            nonce,
            ciphertext,
            auth_tag,
        })
    }
}

impl std::fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedEnvelope")
            .field("nonce", &hex::encode(self.nonce))
            .field("ciphertext_len", &self.ciphertext.len())
            .field("auth_tag", &hex::encode(self.auth_tag))
            .finish()
    }
}

fn decode_lower_hex(field: &str, value: &str) -> Result<Vec<u8>> {
    if let Some(bad) = value
        .chars()
        .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
    {
        return Err(NoteError::EnvelopeParse(format!(
            "field '{}' contains non lower-case hex character {:?}",
            field, bad
        )));
    }
    hex::decode(value)
        .map_err(|e| NoteError::EnvelopeParse(format!("field '{}': {}", field, e)))
}

fn decode_fixed<const N: usize>(field: &str, value: &str) -> Result<[u8; N]> {
    let bytes = decode_lower_hex(field, value)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        NoteError::EnvelopeParse(format!(
            "field '{}' must be {} bytes (got {})",
            field,
            N,
            bytes.len()
        ))
    })
}
