//! Mapping tables for the table-driven codecs
//!
//! Shift_JIS-2004 and the IBM code pages have no implementation in
//! `encoding_rs`, so their byte/Unicode pairs are read from published mapping
//! files: the x0213.org text format (`0x82F5<TAB>U+304B+309A`) and ICU `.ucm`
//! files (`<U3000> \x81\x40 |0`).

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::{Error, Result};

static X0213_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^0x([0-9A-Fa-f]+)\s+U\+([0-9A-Fa-f]+(?:\+[0-9A-Fa-f]+)*)").expect("valid regex")
});

static UCM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:<U[0-9A-Fa-f]+>)+)\s+((?:\\x[0-9A-Fa-f]{2})+)\s*(?:\|([0-4]))?")
        .expect("valid regex")
});

/// Which direction a mapping entry applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Round-trip mapping
    Both,
    /// Unicode to bytes only (a fallback)
    EncodeOnly,
    /// Bytes to Unicode only (a reverse fallback)
    DecodeOnly,
}

/// Counts reported after parsing a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Lines that produced an entry
    pub entries: usize,
    /// Lines that looked like data but could not be parsed
    pub skipped: usize,
}

/// Bidirectional byte-sequence / Unicode-string mapping
#[derive(Debug, Clone)]
pub struct MappingTable {
    decode: HashMap<Vec<u8>, String>,
    encode: HashMap<String, Vec<u8>>,
    /// First bytes of multi-byte entries
    lead: [bool; 256],
    max_bytes: usize,
    max_chars: usize,
}

impl Default for MappingTable {
    fn default() -> Self {
        Self {
            decode: HashMap::new(),
            encode: HashMap::new(),
            lead: [false; 256],
            max_bytes: 1,
            max_chars: 1,
        }
    }
}

impl MappingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; the first entry for a given key wins in each direction
    pub fn insert(&mut self, bytes: Vec<u8>, text: String, direction: Direction) {
        if bytes.is_empty() || text.is_empty() {
            return;
        }
        if bytes.len() > 1 {
            self.lead[bytes[0] as usize] = true;
        }
        self.max_bytes = self.max_bytes.max(bytes.len());
        self.max_chars = self.max_chars.max(text.chars().count());
        if direction != Direction::EncodeOnly {
            self.decode
                .entry(bytes.clone())
                .or_insert_with(|| text.clone());
        }
        if direction != Direction::DecodeOnly {
            self.encode.entry(text).or_insert(bytes);
        }
    }

    /// Number of byte sequences that decode
    pub fn len(&self) -> usize {
        self.decode.len()
    }

    /// Check if the table decodes nothing
    pub fn is_empty(&self) -> bool {
        self.decode.is_empty()
    }

    /// Check if `byte` starts a multi-byte entry
    #[inline]
    pub fn is_lead(&self, byte: u8) -> bool {
        self.lead[byte as usize]
    }

    /// Longest entry that prefixes `bytes`, with the number of bytes it consumes
    pub fn decode_prefix(&self, bytes: &[u8]) -> Option<(&str, usize)> {
        let longest = self.max_bytes.min(bytes.len());
        (1..=longest)
            .rev()
            .find_map(|n| self.decode.get(&bytes[..n]).map(|s| (s.as_str(), n)))
    }

    /// Entry for exactly `bytes`
    pub fn decode_exact(&self, bytes: &[u8]) -> Option<&str> {
        self.decode.get(bytes).map(|s| s.as_str())
    }

    /// Longest entry that prefixes `text`, with the number of UTF-8 bytes of
    /// `text` it consumes
    pub fn encode_prefix(&self, text: &str) -> Option<(&[u8], usize)> {
        let ends: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .skip(1)
            .chain(std::iter::once(text.len()))
            .take(self.max_chars)
            .collect();
        ends.into_iter()
            .rev()
            .find_map(|end| self.encode.get(&text[..end]).map(|b| (b.as_slice(), end)))
    }

    /// Parse an x0213.org style table (`0xXXXX<TAB>U+XXXX[+XXXX]`)
    pub fn parse_x0213(text: &str) -> (Self, LoadSummary) {
        let mut table = Self::new();
        let mut summary = LoadSummary::default();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_x0213_line(line) {
                Ok((bytes, unicode)) => {
                    table.insert(bytes, unicode, Direction::Both);
                    summary.entries += 1;
                }
                Err(reason) => {
                    skip_line(index + 1, reason);
                    summary.skipped += 1;
                }
            }
        }
        (table, summary)
    }

    /// Parse the CHARMAP section of an ICU `.ucm` file
    pub fn parse_ucm(text: &str) -> (Self, LoadSummary) {
        let mut table = Self::new();
        let mut summary = LoadSummary::default();
        let mut in_charmap = false;
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            match line {
                "CHARMAP" => in_charmap = true,
                "END CHARMAP" => in_charmap = false,
                _ if !in_charmap || line.is_empty() || line.starts_with('#') => {}
                _ => match parse_ucm_line(line) {
                    Ok(Some((bytes, unicode, direction))) => {
                        table.insert(bytes, unicode, direction);
                        summary.entries += 1;
                    }
                    Ok(None) => {}
                    Err(reason) => {
                        skip_line(index + 1, reason);
                        summary.skipped += 1;
                    }
                },
            }
        }
        (table, summary)
    }

    /// Read and parse an x0213.org style table file
    pub fn read_x0213(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        let (table, summary) = Self::parse_x0213(&text);
        info!(path = %path.display(), entries = summary.entries, skipped = summary.skipped, "loaded mapping table");
        Ok(table)
    }

    /// Read and parse an ICU `.ucm` file
    pub fn read_ucm(path: &Path) -> Result<Self> {
        let text = read_text(path)?;
        let (table, summary) = Self::parse_ucm(&text);
        info!(path = %path.display(), entries = summary.entries, skipped = summary.skipped, "loaded ucm table");
        Ok(table)
    }
}

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn skip_line(line: usize, reason: String) {
    let skipped = Error::LookupParseSkipped { line, reason };
    debug!("{}", skipped);
}

fn parse_x0213_line(line: &str) -> std::result::Result<(Vec<u8>, String), String> {
    let caps = X0213_LINE
        .captures(line)
        .ok_or_else(|| format!("no mapping in {:?}", line))?;
    let digits = &caps[1];
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in 0x{}", digits));
    }
    let bytes = (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|e| e.to_string())?;
    let unicode = caps[2]
        .split('+')
        .map(parse_scalar)
        .collect::<std::result::Result<String, _>>()?;
    Ok((bytes, unicode))
}

fn parse_ucm_line(line: &str) -> std::result::Result<Option<(Vec<u8>, String, Direction)>, String> {
    let caps = UCM_LINE
        .captures(line)
        .ok_or_else(|| format!("no mapping in {:?}", line))?;
    let direction = match caps.get(3).map(|m| m.as_str()) {
        None | Some("0") => Direction::Both,
        Some("1") => Direction::EncodeOnly,
        Some("3") => Direction::DecodeOnly,
        // |2 and |4 entries describe substitution and extension behavior
        _ => return Ok(None),
    };
    let unicode = caps[1]
        .trim_start_matches("<U")
        .trim_end_matches('>')
        .split("><U")
        .map(parse_scalar)
        .collect::<std::result::Result<String, _>>()?;
    let bytes = caps[2]
        .split("\\x")
        .filter(|s| !s.is_empty())
        .map(|s| u8::from_str_radix(s, 16).map_err(|e| e.to_string()))
        .collect::<std::result::Result<Vec<u8>, _>>()?;
    Ok(Some((bytes, unicode, direction)))
}

fn parse_scalar(hex: &str) -> std::result::Result<char, String> {
    let value = u32::from_str_radix(hex, 16).map_err(|e| e.to_string())?;
    char::from_u32(value).ok_or_else(|| format!("U+{} is not a scalar value", hex))
}
