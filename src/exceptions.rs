//! Exception tables: variant characters and kanji usage levels
//!
//! Both tables are built once before a sweep and never change afterwards.
//! Lines that do not match the table grammar are skipped and counted.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;
use unicode_segmentation::UnicodeSegmentation;

use crate::tables::{read_text, skip_line, LoadSummary};
use crate::Result;

static VARIANT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^ *U\+(\S+) +U\+(\S+)(?: +U\+(\S+))?(?: +([^#\s]+))?.*$").expect("valid regex")
});

static KANJI_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d) (\S+)$").expect("valid regex"));

/// Usage level that replaces any earlier entry for the same character
const PRIORITY_LEVEL: char = '3';

/// An alternate form of a character
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variant {
    /// The alternate string, usually a base character plus a variation selector
    pub alternate: String,
    /// Free-text note
    pub note: Option<String>,
}

impl Variant {
    /// Whether the alternate adds something beyond the normalization forms
    /// of the character
    pub fn differs_from(&self, nfc: &str, nfkc: &str) -> bool {
        !self.alternate.starts_with(nfc) && self.alternate != nfkc
    }
}

/// Character to [`Variant`] lookup
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    entries: HashMap<String, Variant>,
}

impl VariantTable {
    /// Parse lines of the form `U+XXXX U+YYYY [U+ZZZZ] [note] [# comment]`.
    /// A later line for the same character replaces an earlier one.
    pub fn parse(text: &str) -> (Self, LoadSummary) {
        let mut entries = HashMap::new();
        let mut summary = LoadSummary::default();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            match parse_variant_line(line) {
                Ok((key, variant)) => {
                    entries.insert(key, variant);
                    summary.entries += 1;
                }
                Err(reason) => {
                    skip_line(index + 1, reason);
                    summary.skipped += 1;
                }
            }
        }
        (Self { entries }, summary)
    }

    /// Read and parse a variant table file
    pub fn read(path: &Path) -> Result<Self> {
        let (table, summary) = Self::parse(&read_text(path)?);
        info!(path = %path.display(), entries = summary.entries, skipped = summary.skipped, "loaded variant table");
        Ok(table)
    }

    /// Look up the variant of `text`
    pub fn get(&self, text: &str) -> Option<&Variant> {
        self.entries.get(text)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_variant_line(line: &str) -> std::result::Result<(String, Variant), String> {
    let caps = VARIANT_LINE
        .captures(line)
        .ok_or_else(|| format!("not a variant entry: {:?}", line))?;
    let key = code_point(&caps[1])?;
    let mut alternate = code_point(&caps[2])?;
    if let Some(selector) = caps.get(3) {
        alternate.push_str(&code_point(selector.as_str())?);
    }
    let note = caps.get(4).map(|m| m.as_str().to_string());
    Ok((key, Variant { alternate, note }))
}

fn code_point(hex: &str) -> std::result::Result<String, String> {
    u32::from_str_radix(hex, 16)
        .ok()
        .and_then(char::from_u32)
        .map(String::from)
        .ok_or_else(|| format!("invalid code point U+{}", hex))
}

/// Character to kanji usage level digit lookup
#[derive(Debug, Clone, Default)]
pub struct KanjiLevels {
    levels: HashMap<String, char>,
}

impl KanjiLevels {
    /// Parse lines of the form `<digit> <characters>`.
    ///
    /// Every grapheme of the character run gets the digit. The first entry for
    /// a grapheme is kept, except that level `3` always replaces an earlier one.
    pub fn parse(text: &str) -> (Self, LoadSummary) {
        let mut levels = HashMap::new();
        let mut summary = LoadSummary::default();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(caps) = KANJI_LINE.captures(line) else {
                skip_line(index + 1, format!("not a kanji entry: {:?}", line));
                summary.skipped += 1;
                continue;
            };
            let level = caps[1].chars().next().unwrap_or('0');
            for grapheme in caps[2].graphemes(true) {
                if level == PRIORITY_LEVEL || !levels.contains_key(grapheme) {
                    levels.insert(grapheme.to_string(), level);
                }
            }
            summary.entries += 1;
        }
        (Self { levels }, summary)
    }

    /// Read and parse a kanji level file
    pub fn read(path: &Path) -> Result<Self> {
        let (table, summary) = Self::parse(&read_text(path)?);
        info!(path = %path.display(), entries = summary.entries, skipped = summary.skipped, "loaded kanji levels");
        Ok(table)
    }

    /// Level digit of `text`
    pub fn get(&self, text: &str) -> Option<char> {
        self.levels.get(text).copied()
    }

    /// Number of characters with a level
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// The two exception tables consumed by record construction and classification
#[derive(Debug, Clone, Default)]
pub struct ExceptionTables {
    /// Variant characters
    pub variants: VariantTable,
    /// Kanji usage levels
    pub kanji: KanjiLevels,
}

impl ExceptionTables {
    /// Bundle already built tables
    pub fn new(variants: VariantTable, kanji: KanjiLevels) -> Self {
        Self { variants, kanji }
    }

    /// Read whichever table files are given; a missing path gives an empty table
    pub fn load(variants: Option<&Path>, kanji: Option<&Path>) -> Result<Self> {
        Ok(Self {
            variants: variants.map(VariantTable::read).transpose()?.unwrap_or_default(),
            kanji: kanji.map(KanjiLevels::read).transpose()?.unwrap_or_default(),
        })
    }
}
