//! URL codec.
//!
//! Maps a page address to one of three pages, and a rated session to a
//! shareable address:
//!
//! | Address | Page |
//! |---|---|
//! | `/` (or anything unrecognised) | browse the catalog |
//! | `/?<spectrum_id>` | fresh ratings, unlocked |
//! | `/#<token>` | shared ratings, locked |
//!
//! A token is the standard base64 encoding of the UTF-8 payload
//! `ID=<spectrum_id>&<id1>=<v1>&<id2>=<v2>...`. This is byte-for-byte what
//! a browser produces with `btoa(unescape(encodeURIComponent(payload)))`,
//! so links made either way decode the same.
//!
//! Decoding never fails: any problem with a link lands on the browse page.

use std::collections::HashMap;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use rand::RngCore;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, Spectrum};
use crate::domain::Ratings;

use super::engine::{merge_defaults, DefaultPolicy};

/// Payload key holding the spectrum id
pub const SPECTRUM_KEY: &str = "ID";

/// Standard alphabet; padded on encode, padding optional on decode
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The query and fragment of a page address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Text after `?` and before `#`, percent-decoded
    pub query: Option<String>,

    /// Text after `#`, as given
    pub fragment: Option<String>,
}

impl Address {
    /// Split an address. Accepts full URLs (`https://host/page?x#y`), paths,
    /// or bare `?x` / `#y` components.
    pub fn parse(address: &str) -> Self {
        let (before_hash, fragment) = match address.split_once('#') {
            Some((before, after)) => (before, Some(after)),
            None => (address, None),
        };
        let query = before_hash.split_once('?').map(|(_, q)| q);

        Self {
            query: query.filter(|q| !q.is_empty()).map(percent_decode),
            fragment: fragment
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        }
    }
}

/// Which page an address asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Catalog browse
    Browse,

    /// Fresh ratings for a known spectrum id
    Fresh(String),

    /// Shared ratings carried in a token
    Shared(String),
}

impl PageRequest {
    /// Decide the page from the address shape. A query only counts when it
    /// names a spectrum in the catalog.
    pub fn from_address(address: &Address, catalog: &Catalog) -> Self {
        if let Some(query) = &address.query {
            if catalog.contains(query) {
                return PageRequest::Fresh(query.clone());
            }
        }
        match &address.fragment {
            Some(fragment) => PageRequest::Shared(fragment.clone()),
            None => PageRequest::Browse,
        }
    }
}

/// A value from a decoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl FieldValue {
    fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) => FieldValue::Int(n),
            Err(_) => FieldValue::Text(raw.to_string()),
        }
    }
}

/// The key/value pairs carried by a token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    /// Raw text of the `ID` field, if present
    pub spectrum_id: Option<String>,

    /// Every other field, in payload order
    pub fields: Vec<(String, FieldValue)>,
}

impl Payload {
    /// Split `ID=x&a=1&b=2`. Empty segments are skipped, a segment without
    /// `=` gets an empty value, and only the text up to a second `=` is
    /// kept.
    pub fn parse(payload: &str) -> Self {
        let mut parsed = Payload::default();
        for segment in payload.split('&').filter(|s| !s.is_empty()) {
            let mut parts = segment.split('=');
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();

            if key == SPECTRUM_KEY {
                parsed.spectrum_id = Some(value.to_string());
            } else {
                parsed.fields.push((key.to_string(), FieldValue::parse(value)));
            }
        }
        parsed
    }

    /// Integer fields as a map; later repeats of a key win
    pub fn integers(&self) -> HashMap<String, i64> {
        self.fields
            .iter()
            .filter_map(|(key, value)| match value {
                FieldValue::Int(n) => Some((key.clone(), *n)),
                FieldValue::Text(_) => None,
            })
            .collect()
    }
}

/// The session a page address resolves to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    pub spectrum: Option<Spectrum>,
    pub ratings: Option<Ratings>,
    pub locked: bool,
}

impl Decoded {
    /// The catalog browse page
    pub fn browse() -> Self {
        Self {
            spectrum: None,
            ratings: None,
            locked: false,
        }
    }
}

/// Flat payload for a session: `ID=<id>` then `&<id>=<confidence>` per
/// rating in insertion order
pub fn encode_payload(spectrum_id: &str, ratings: &Ratings) -> String {
    let mut payload = format!("{}={}", SPECTRUM_KEY, spectrum_id);
    for (id, confidence) in ratings.iter() {
        payload.push('&');
        payload.push_str(id);
        payload.push('=');
        payload.push_str(&confidence.to_string());
    }
    payload
}

/// Base64 of the payload's UTF-8 bytes
pub fn encode_token(payload: &str) -> String {
    TOKEN_ENGINE.encode(payload.as_bytes())
}

/// Fragment for a session: `#<token>`
pub fn encode(spectrum_id: &str, ratings: &Ratings) -> String {
    format!("#{}", encode_token(&encode_payload(spectrum_id, ratings)))
}

/// Shareable address under `base` (e.g. `/` or `https://host/index.html`)
pub fn share_link(base: &str, spectrum_id: &str, ratings: &Ratings) -> String {
    format!("{}{}", base, encode(spectrum_id, ratings))
}

/// Address of a fresh rating page under `base`
pub fn fresh_link(base: &str, spectrum_id: &str) -> String {
    format!("{}?{}", base, urlencoding::encode(spectrum_id))
}

/// Recover the payload text from a token
pub fn decode_token(token: &str) -> Result<String, CodecError> {
    let token = percent_decode(token.trim());
    let bytes = TOKEN_ENGINE.decode(token.trim().as_bytes())?;
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

/// Resolve a shared token against the catalog
pub fn decode_shared(token: &str, catalog: &Catalog) -> Result<Decoded, CodecError> {
    let payload = Payload::parse(&decode_token(token)?);

    let spectrum_id = payload
        .spectrum_id
        .as_deref()
        .ok_or(CodecError::MissingSpectrumId)?;
    let spectrum = catalog
        .get(spectrum_id)
        .ok_or_else(|| CodecError::UnknownSpectrum(spectrum_id.to_string()))?;

    for (key, value) in &payload.fields {
        if let FieldValue::Text(text) = value {
            debug!(key = %key, value = %text, "ignoring non-integer rating");
        }
    }

    let ratings = merge_defaults(spectrum, &payload.integers(), DefaultPolicy::Neutral);
    Ok(Decoded {
        spectrum: Some(spectrum.clone()),
        ratings: Some(ratings),
        locked: true,
    })
}

/// Resolve a page address. Fresh pages draw random defaults from `rng`.
pub fn decode(address: &str, catalog: &Catalog, rng: &mut dyn RngCore) -> Decoded {
    match PageRequest::from_address(&Address::parse(address), catalog) {
        PageRequest::Fresh(id) => match catalog.get(&id) {
            Some(spectrum) => {
                let ratings =
                    merge_defaults(spectrum, &HashMap::new(), DefaultPolicy::Random(rng));
                Decoded {
                    spectrum: Some(spectrum.clone()),
                    ratings: Some(ratings),
                    locked: false,
                }
            }
            None => Decoded::browse(),
        },
        PageRequest::Shared(token) => decode_shared(&token, catalog).unwrap_or_else(|e| {
            debug!(error = %e, "shared link not usable, showing catalog");
            Decoded::browse()
        }),
        PageRequest::Browse => Decoded::browse(),
    }
}

fn percent_decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

/// Reasons a shared token could not be used
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Token is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Token does not decode to UTF-8 text")]
    InvalidUtf8,

    #[error("Token has no 'ID' field")]
    MissingSpectrumId,

    #[error("Unknown spectrum: {0}")]
    UnknownSpectrum(String),
}
