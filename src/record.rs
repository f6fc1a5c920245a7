//! Character mapping records
//!
//! A [`CharRecord`] is the cross-encoding snapshot of one code position: the
//! character it decodes to, its normalization forms, and its byte form in every
//! configured encoding. [`RecordBuilder`] constructs records for each kind of
//! position.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};
use unicode_normalization::UnicodeNormalization;

use crate::codec::{Codec, CodecSet, ShiftJis, Windows31j, REPLACEMENT};
use crate::exceptions::{ExceptionTables, Variant};
use crate::kuten::{self, Kuten, MenKuten};
use crate::multibyte::is_ebcdic_kanji;
use crate::{hex, Encoding, Result};

/// Which layout a double-byte record is read in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DoubleByteLayout {
    /// Windows-31J, including the vendor rows
    Windows31j,
    /// Strict JIS X 0208
    JisX0208,
}

/// What kind of position a record describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RecordKind {
    /// A JIS X 0201 byte; `alternate` marks the second reading of 0x5C / 0x7E
    SingleByte {
        /// The byte
        byte: u8,
        /// Whether this is the yen-sign / overline reading
        alternate: bool,
    },
    /// A row-column position of the Windows-31J / JIS X 0208 table
    DoubleByte {
        /// The coordinate
        kuten: Kuten,
        /// Which decoder defines the character
        layout: DoubleByteLayout,
        /// Strict Shift_JIS reading of the same bytes
        strict: String,
    },
    /// A JIS X 0213 position
    Jis0213 {
        /// Plane, 1 or 2
        plane: u8,
        /// The coordinate within the plane
        kuten: Kuten,
        /// Strict Shift_JIS reading of the same bytes
        strict: String,
        /// Windows-31J reading of the same bytes
        windows: String,
    },
    /// A JIS X 0212 position
    Jis0212 {
        /// The coordinate
        kuten: Kuten,
    },
    /// A standalone combining mark with no byte position of its own
    Combining {
        /// The mark
        code_point: char,
    },
}

/// Where a record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Coordinate {
    /// A single byte
    Byte(u8),
    /// A row-column position
    Kuten(Kuten),
    /// A plane-row-column position
    MenKuten(MenKuten),
    /// A code point without a byte position
    CodePoint(char),
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Byte(b) => write!(f, "0x{:02X}", b),
            Coordinate::Kuten(k) => k.fmt(f),
            Coordinate::MenKuten(mk) => mk.fmt(f),
            Coordinate::CodePoint(c) => write!(f, "U+{:04X}", *c as u32),
        }
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl RecordKind {
    /// The coordinate this record was built from
    pub fn coordinate(&self) -> Coordinate {
        match self {
            RecordKind::SingleByte { byte, .. } => Coordinate::Byte(*byte),
            RecordKind::DoubleByte { kuten, .. } => Coordinate::Kuten(*kuten),
            RecordKind::Jis0213 { plane, kuten, .. } => {
                Coordinate::MenKuten(MenKuten::new(*plane, kuten.row, kuten.col))
            }
            RecordKind::Jis0212 { kuten } => Coordinate::MenKuten(MenKuten::new(2, kuten.row, kuten.col)),
            RecordKind::Combining { code_point } => Coordinate::CodePoint(*code_point),
        }
    }
}

/// Byte sequence rendered as hex; a single SO/SI framed EBCDIC kanji is
/// rendered without its framing
pub fn render_bytes(encoding: Encoding, bytes: &[u8]) -> String {
    if encoding.is_ebcdic() && is_ebcdic_kanji(bytes) {
        hex(&bytes[1..3])
    } else {
        hex(bytes)
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex(bytes))
}

fn serialize_encoded<S: Serializer>(
    encoded: &BTreeMap<Encoding, Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(
        encoded
            .iter()
            .map(|(encoding, bytes)| (encoding.name(), render_bytes(*encoding, bytes))),
    )
}

/// Cross-encoding snapshot of one code position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharRecord {
    /// Kind of position, with its per-kind fields
    #[serde(flatten)]
    pub kind: RecordKind,
    /// The character at this position; exactly U+FFFD when undefined
    pub canonical: String,
    /// The single scalar value, when `canonical` is one and defined
    pub code_point: Option<char>,
    /// Canonical composition of `canonical`
    pub nfc: String,
    /// Canonical decomposition of `canonical`
    pub nfd: String,
    /// Compatibility composition of `canonical`
    pub nfkc: String,
    /// The bytes that define this position (empty for combining marks)
    #[serde(serialize_with = "serialize_hex")]
    pub defining: Vec<u8>,
    /// `canonical` encoded in every configured encoding
    #[serde(serialize_with = "serialize_encoded")]
    pub encoded: BTreeMap<Encoding, Vec<u8>>,
    /// Alternate form from the variant table
    pub variant: Option<Variant>,
}

impl CharRecord {
    /// Whether this position has no character
    pub fn is_undefined(&self) -> bool {
        self.canonical.contains(REPLACEMENT)
    }

    /// The coordinate this record was built from
    pub fn coordinate(&self) -> Coordinate {
        self.kind.coordinate()
    }

    /// `canonical` encoded in `encoding`, if configured
    pub fn encoded(&self, encoding: Encoding) -> Option<&[u8]> {
        self.encoded.get(&encoding).map(Vec::as_slice)
    }

    /// Whether the encoded form in `encoding` contains its substitution byte
    pub fn has_substitution(&self, encoding: Encoding) -> bool {
        self.encoded(encoding)
            .is_some_and(|bytes| bytes.contains(&encoding.substitution()))
    }

    /// The variant, when it says more than the normalization forms do
    pub fn distinct_variant(&self) -> Option<&Variant> {
        self.variant
            .as_ref()
            .filter(|v| v.differs_from(&self.nfc, &self.nfkc))
    }
}

/// Builds records against one codec set and one pair of exception tables
#[derive(Clone, Copy)]
pub struct RecordBuilder<'a> {
    codecs: &'a CodecSet,
    tables: &'a ExceptionTables,
}

impl<'a> RecordBuilder<'a> {
    /// Create a builder
    pub fn new(codecs: &'a CodecSet, tables: &'a ExceptionTables) -> Self {
        Self { codecs, tables }
    }

    /// The codecs records are encoded with
    pub fn codecs(&self) -> &'a CodecSet {
        self.codecs
    }

    fn decode(&self, encoding: Encoding, bytes: &[u8]) -> String {
        self.codecs
            .decode(encoding, bytes)
            .unwrap_or_else(|| REPLACEMENT.to_string())
    }

    /// Assemble a record from its kind, character and defining bytes
    pub fn build(&self, kind: RecordKind, canonical: String, defining: Vec<u8>) -> CharRecord {
        let canonical = if canonical.starts_with(REPLACEMENT) {
            REPLACEMENT.to_string()
        } else {
            canonical
        };
        let mut chars = canonical.chars();
        let code_point = match (chars.next(), chars.next()) {
            (Some(c), None) if c != REPLACEMENT => Some(c),
            _ => None,
        };
        let encoded = self
            .codecs
            .encodings()
            .filter_map(|e| self.codecs.encode(e, &canonical).map(|bytes| (e, bytes)))
            .collect();
        CharRecord {
            nfc: canonical.nfc().collect(),
            nfd: canonical.nfd().collect(),
            nfkc: canonical.nfkc().collect(),
            variant: self.tables.variants.get(&canonical).cloned(),
            kind,
            code_point,
            defining,
            encoded,
            canonical,
        }
    }

    /// Records of a JIS X 0201 byte: one, or two for 0x5C and 0x7E
    pub fn single_byte(&self, byte: u8) -> Vec<CharRecord> {
        let canonical = ShiftJis.decode(&[byte]);
        let mut records = vec![self.build(
            RecordKind::SingleByte {
                byte,
                alternate: false,
            },
            canonical,
            vec![byte],
        )];
        let alternate = match byte {
            0x5C => Some('\u{A5}'),
            0x7E => Some('\u{203E}'),
            _ => None,
        };
        if let Some(c) = alternate {
            records.push(self.build(
                RecordKind::SingleByte {
                    byte,
                    alternate: true,
                },
                c.to_string(),
                vec![byte],
            ));
        }
        records
    }

    /// The strict JIS X 0208 reading of a Windows-31J position, whether or
    /// not it differs from the Windows reading
    pub fn jis_x0208(&self, row: u8, col: u8) -> Result<CharRecord> {
        let sjis = kuten::kuten_to_shift_jis(row, col)?;
        let bytes = kuten::to_bytes(sjis, 2);
        let strict = ShiftJis.decode(&bytes);
        Ok(self.build(
            RecordKind::DoubleByte {
                kuten: Kuten::new(row, col),
                layout: DoubleByteLayout::JisX0208,
                strict: strict.clone(),
            },
            strict,
            bytes,
        ))
    }

    /// The Windows-31J reading of a position
    pub fn windows_31j(&self, row: u8, col: u8) -> Result<CharRecord> {
        let sjis = kuten::kuten_to_shift_jis(row, col)?;
        let bytes = kuten::to_bytes(sjis, 2);
        let strict = ShiftJis.decode(&bytes);
        let canonical = Windows31j.decode(&bytes);
        Ok(self.build(
            RecordKind::DoubleByte {
                kuten: Kuten::new(row, col),
                layout: DoubleByteLayout::Windows31j,
                strict,
            },
            canonical,
            bytes,
        ))
    }

    /// Records of a Windows-31J position. When the strict reading is defined
    /// and differs, its record comes first.
    pub fn double_byte(&self, row: u8, col: u8) -> Result<Vec<CharRecord>> {
        let windows = self.windows_31j(row, col)?;
        let RecordKind::DoubleByte { strict, .. } = &windows.kind else {
            return Ok(vec![windows]);
        };
        if strict.starts_with(REPLACEMENT) || *strict == windows.canonical {
            return Ok(vec![windows]);
        }
        Ok(vec![self.jis_x0208(row, col)?, windows])
    }

    /// Record of a JIS X 0213 position.
    ///
    /// Fails with [`crate::Error::InvalidRegion`] for plane 2 rows that
    /// Shift_JIS-2004 does not address.
    pub fn jis0213(&self, plane: u8, row: u8, col: u8) -> Result<CharRecord> {
        let sjis = kuten::kuten_to_shift_jis_plane(plane, row, col)?;
        let bytes = kuten::to_bytes(sjis, 2);
        let canonical = self.decode(Encoding::SHIFT_JIS_2004, &bytes);
        Ok(self.build(
            RecordKind::Jis0213 {
                plane,
                kuten: Kuten::new(row, col),
                strict: ShiftJis.decode(&bytes),
                windows: Windows31j.decode(&bytes),
            },
            canonical,
            bytes,
        ))
    }

    /// Record of a JIS X 0212 position, defined by its three-byte EUC-JP form
    pub fn jis0212(&self, row: u8, col: u8) -> Result<CharRecord> {
        let euc = kuten::kuten_to_euc_plane(2, row, col)?;
        let bytes = kuten::to_bytes(euc, 3);
        let canonical = self.decode(Encoding::EUC_JP, &bytes);
        Ok(self.build(RecordKind::Jis0212 { kuten: Kuten::new(row, col) }, canonical, bytes))
    }

    /// Record of a standalone combining mark
    pub fn combining(&self, code_point: char) -> CharRecord {
        self.build(
            RecordKind::Combining { code_point },
            code_point.to_string(),
            Vec::new(),
        )
    }
}
