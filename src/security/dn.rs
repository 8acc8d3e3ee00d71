//! X.509 subject distinguished names in RFC 4514 string form.
//!
//! # Responsibilities
//! - Parse DN strings such as `cn=John Doe,ou=people,dc=org`
//! - Compare DNs structurally, not textually
//!
//! # Design Decisions
//! - Attribute types are case-insensitive; well-known OIDs map to their short names
//! - Values compare case-insensitively with surrounding whitespace removed
//!   and inner whitespace runs collapsed
//! - Multi-valued RDNs (`cn=a+uid=b`) compare as sets
//! - Legacy `;` separators and quoted values (RFC 2253) are accepted

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while parsing a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DnError {
    #[error("expected '=' after attribute type at position {0}")]
    MissingEquals(usize),

    #[error("empty attribute type at position {0}")]
    EmptyAttributeType(usize),

    #[error("invalid attribute type '{0}'")]
    InvalidAttributeType(String),

    #[error("invalid escape sequence at position {0}")]
    InvalidEscape(usize),

    #[error("unterminated quoted value starting at position {0}")]
    UnterminatedQuote(usize),

    #[error("invalid hex-encoded value at position {0}")]
    InvalidHexValue(usize),

    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedCharacter { ch: char, position: usize },

    #[error("attribute value is not valid UTF-8")]
    InvalidUtf8,
}

/// One `type=value` pair, already normalized for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeTypeAndValue {
    attr_type: String,
    value: String,
}

impl AttributeTypeAndValue {
    /// Normalized attribute type (lowercase short name or numeric OID).
    pub fn attr_type(&self) -> &str {
        &self.attr_type
    }

    /// Normalized attribute value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A relative distinguished name: a set of attribute assertions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rdn {
    // sorted so that equality is set equality
    attributes: Vec<AttributeTypeAndValue>,
}

impl Rdn {
    pub fn attributes(&self) -> &[AttributeTypeAndValue] {
        &self.attributes
    }
}

/// A parsed distinguished name.
///
/// Equality and hashing use the normalized RDN sequence; the original text
/// is kept only for display.
#[derive(Debug, Clone)]
pub struct DistinguishedName {
    text: String,
    rdns: Vec<Rdn>,
}

impl DistinguishedName {
    /// Parse a DN from its string representation.
    pub fn parse(input: &str) -> Result<Self, DnError> {
        let rdns = Parser::new(input).parse()?;
        Ok(Self {
            text: input.trim().to_string(),
            rdns,
        })
    }

    /// The RDNs, most specific first.
    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// True for the zero-length (root) DN.
    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    /// The text this DN was parsed from.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

impl Eq for DistinguishedName {}

impl Hash for DistinguishedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rdns.hash(state);
    }
}

impl FromStr for DistinguishedName {
    type Err = DnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Short names for OIDs that commonly appear in certificate subjects.
const OID_NAMES: &[(&str, &str)] = &[
    ("2.5.4.3", "cn"),
    ("2.5.4.5", "serialnumber"),
    ("2.5.4.6", "c"),
    ("2.5.4.7", "l"),
    ("2.5.4.8", "st"),
    ("2.5.4.9", "street"),
    ("2.5.4.10", "o"),
    ("2.5.4.11", "ou"),
    ("0.9.2342.19200300.100.1.1", "uid"),
    ("0.9.2342.19200300.100.1.25", "dc"),
    ("1.2.840.113549.1.9.1", "emailaddress"),
];

fn normalize_type(raw: &str) -> Result<String, DnError> {
    let lower = raw.to_ascii_lowercase();
    let name = lower.strip_prefix("oid.").unwrap_or(&lower);

    let first = name
        .chars()
        .next()
        .ok_or_else(|| DnError::InvalidAttributeType(raw.to_string()))?;

    if first.is_ascii_digit() {
        let valid = name
            .split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()));
        if !valid {
            return Err(DnError::InvalidAttributeType(raw.to_string()));
        }
        let short = OID_NAMES
            .iter()
            .find(|(oid, _)| *oid == name)
            .map(|(_, short)| short.to_string());
        return Ok(short.unwrap_or_else(|| name.to_string()));
    }

    if !first.is_ascii_alphabetic()
        || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    {
        return Err(DnError::InvalidAttributeType(raw.to_string()));
    }

    // "e" and "email" are legacy spellings seen in older certificates
    Ok(match name {
        "e" | "email" => "emailaddress".to_string(),
        other => other.to_string(),
    })
}

fn normalize_value(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> DnError {
        let ch = std::str::from_utf8(&self.input[self.pos..])
            .ok()
            .and_then(|rest| rest.chars().next())
            .unwrap_or('\u{fffd}');
        DnError::UnexpectedCharacter {
            ch,
            position: self.pos,
        }
    }

    fn parse(mut self) -> Result<Vec<Rdn>, DnError> {
        let mut rdns = Vec::new();
        self.skip_spaces();
        if self.peek().is_none() {
            return Ok(rdns);
        }

        loop {
            rdns.push(self.parse_rdn()?);
            match self.peek() {
                None => return Ok(rdns),
                Some(b',') | Some(b';') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn parse_rdn(&mut self) -> Result<Rdn, DnError> {
        let mut attributes = vec![self.parse_attribute()?];
        while self.peek() == Some(b'+') {
            self.pos += 1;
            attributes.push(self.parse_attribute()?);
        }
        attributes.sort();
        attributes.dedup();
        Ok(Rdn { attributes })
    }

    fn parse_attribute(&mut self) -> Result<AttributeTypeAndValue, DnError> {
        self.skip_spaces();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'=' | b',' | b';' | b'+') {
                break;
            }
            self.pos += 1;
        }

        let raw_type = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| DnError::InvalidUtf8)?
            .trim();
        if raw_type.is_empty() {
            return Err(DnError::EmptyAttributeType(start));
        }
        if self.peek() != Some(b'=') {
            return Err(DnError::MissingEquals(self.pos));
        }
        self.pos += 1;
        let attr_type = normalize_type(raw_type)?;

        self.skip_spaces();
        let value = match self.peek() {
            Some(b'#') => self.parse_hex_value()?,
            Some(b'"') => self.parse_quoted_value()?,
            _ => self.parse_string_value()?,
        };

        Ok(AttributeTypeAndValue { attr_type, value })
    }

    fn parse_hex_value(&mut self) -> Result<String, DnError> {
        let start = self.pos;
        self.pos += 1;
        let digits_start = self.pos;
        while self.peek().is_some_and(|b| hex_digit(b).is_some()) {
            self.pos += 1;
        }
        let digits = &self.input[digits_start..self.pos];
        if digits.is_empty() || digits.len() % 2 != 0 {
            return Err(DnError::InvalidHexValue(start));
        }
        self.skip_spaces();
        if !matches!(self.peek(), None | Some(b',') | Some(b';') | Some(b'+')) {
            return Err(DnError::InvalidHexValue(start));
        }
        let digits = std::str::from_utf8(digits).map_err(|_| DnError::InvalidUtf8)?;
        Ok(format!("#{}", digits.to_ascii_lowercase()))
    }

    fn parse_quoted_value(&mut self) -> Result<String, DnError> {
        let start = self.pos;
        self.pos += 1;
        let mut bytes = Vec::new();
        loop {
            match self.peek() {
                None => return Err(DnError::UnterminatedQuote(start)),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => bytes.push(self.parse_escape()?),
                Some(b) => {
                    bytes.push(b);
                    self.pos += 1;
                }
            }
        }
        self.skip_spaces();
        if !matches!(self.peek(), None | Some(b',') | Some(b';') | Some(b'+')) {
            return Err(self.unexpected());
        }
        let value = String::from_utf8(bytes).map_err(|_| DnError::InvalidUtf8)?;
        Ok(normalize_value(&value))
    }

    fn parse_string_value(&mut self) -> Result<String, DnError> {
        let mut bytes = Vec::new();
        // length up to the last byte that must survive trailing-space trimming
        let mut keep = 0;
        loop {
            match self.peek() {
                None | Some(b',') | Some(b';') | Some(b'+') => break,
                Some(b'\\') => {
                    bytes.push(self.parse_escape()?);
                    keep = bytes.len();
                }
                Some(b'"') | Some(b'<') | Some(b'>') => return Err(self.unexpected()),
                Some(b) => {
                    bytes.push(b);
                    self.pos += 1;
                    if b != b' ' {
                        keep = bytes.len();
                    }
                }
            }
        }
        bytes.truncate(keep);
        let value = String::from_utf8(bytes).map_err(|_| DnError::InvalidUtf8)?;
        Ok(normalize_value(&value))
    }

    /// Consume a backslash escape and return the byte it denotes.
    fn parse_escape(&mut self) -> Result<u8, DnError> {
        let start = self.pos;
        self.pos += 1;
        let first = self.peek().ok_or(DnError::InvalidEscape(start))?;
        if let Some(high) = hex_digit(first) {
            let low = self
                .input
                .get(self.pos + 1)
                .copied()
                .and_then(hex_digit)
                .ok_or(DnError::InvalidEscape(start))?;
            self.pos += 2;
            return Ok(high << 4 | low);
        }
        if matches!(
            first,
            b',' | b'=' | b'+' | b'<' | b'>' | b'#' | b';' | b'\\' | b'"' | b' '
        ) {
            self.pos += 1;
            return Ok(first);
        }
        Err(DnError::InvalidEscape(start))
    }
}
