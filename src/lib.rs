//! # jis-charsets - JIS Character Set Cross-Reference Engine
//!
//! Computes, for every code position of JIS X 0201, JIS X 0208, JIS X 0212
//! and JIS X 0213 (and the vendor layouts built on them), the character's
//! byte form in every other Japanese encoding, how it behaves under Unicode
//! normalization, and a six-digit classification ("kubun") describing how
//! faithfully it round-trips.
//!
//! ## Features
//!
//! - **Coordinate arithmetic** for ku-ten / men-ku-ten to JIS, EUC-JP and Shift_JIS words
//! - **Cross-encoding records** for ISO-2022-JP, EUC-JP, Shift_JIS, Shift_JIS-2004,
//!   Windows-31J and the IBM-942/943/930/939 code pages
//! - **Round-trip fidelity** per destination encoding
//! - **Classification codes** with a typed per-axis representation
//!
//! ## Quick Start
//!
//! ```rust
//! use jis_charsets::{CodecSet, ExceptionTables, Sweep, SweepOptions, ClassifierOptions};
//!
//! let codecs = CodecSet::builtin();
//! let tables = ExceptionTables::default();
//! let sweep = Sweep::new(&codecs, &tables, ClassifierOptions::default(), SweepOptions::default());
//!
//! let entry = sweep.double_byte(16, 1).unwrap().pop().unwrap();
//! assert_eq!(entry.record.canonical, "亜");
//! assert_eq!(&entry.kubun.to_string()[2..5], "313");
//! ```

#![deny(missing_docs)]

use std::fmt;

use serde::{Serialize, Serializer};

pub mod codec;
pub mod config;
pub mod exceptions;
pub mod fidelity;
mod iso2022;
pub mod kubun;
pub mod kuten;
pub mod multibyte;
pub mod record;
pub mod sweep;
pub mod tables;

pub use codec::{Codec, CodecSet};
pub use config::Config;
pub use exceptions::{ExceptionTables, KanjiLevels, Variant, VariantTable};
pub use fidelity::{Check, Fidelity, FidelityReport, Verdict};
pub use kubun::{Classifier, ClassifierOptions, Kubun, NormalizationScheme, VendorPolicy};
pub use kuten::{Kuten, MenKuten};
pub use record::{CharRecord, Coordinate, DoubleByteLayout, RecordBuilder, RecordKind};
pub use sweep::{Entry, Section, Sweep, SweepOptions};
pub use tables::MappingTable;

/// Result type for charset operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting coordinates or loading tables
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Argument outside a function's valid domain
    OutOfRange {
        /// Name of the argument
        name: &'static str,
        /// The rejected value
        value: u32,
        /// Smallest accepted value
        min: u32,
        /// Largest accepted value
        max: u32,
    },
    /// Coordinate inside a block the standard reserves; callers iterating
    /// whole blocks skip it
    InvalidRegion {
        /// Plane of the coordinate
        plane: u8,
        /// Row of the coordinate
        row: u8,
    },
    /// A malformed line in a lookup or mapping table
    LookupParseSkipped {
        /// One-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },
    /// A table or configuration file could not be read
    Io {
        /// Path of the file
        path: String,
        /// The underlying I/O error message
        message: String,
    },
    /// The configuration is malformed
    Config(String),
}

impl Error {
    /// Whether this error only means "skip this coordinate"
    pub fn is_skip(&self) -> bool {
        matches!(self, Error::InvalidRegion { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfRange {
                name,
                value,
                min,
                max,
            } => {
                write!(f, "{} = {} is outside {}..={}", name, value, min, max)
            }
            Error::InvalidRegion { plane, row } => {
                write!(f, "plane {} row {} is a reserved region", plane, row)
            }
            Error::LookupParseSkipped { line, reason } => {
                write!(f, "Skipped line {}: {}", line, reason)
            }
            Error::Io { path, message } => write!(f, "Cannot read {}: {}", path, message),
            Error::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Destination encodings a character is mapped into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    /// ISO-2022-JP with the JIS X 0212 extension of ISO-2022-JP-2
    ISO_2022_JP,
    /// EUC-JP (JIS X 0201, JIS X 0208, JIS X 0212)
    EUC_JP,
    /// Shift_JIS restricted to JIS X 0201 and JIS X 0208
    SHIFT_JIS,
    /// Shift_JIS-2004 (JIS X 0213)
    SHIFT_JIS_2004,
    /// Windows-31J (Microsoft code page 932)
    WINDOWS_31J,
    /// IBM-942 (ASCII-based Japanese, 1978 layout)
    IBM_942,
    /// IBM-943 (ASCII-based Japanese, 1990 layout)
    IBM_943,
    /// IBM-930 (EBCDIC katakana, mixed SBCS/DBCS)
    IBM_930,
    /// IBM-939 (EBCDIC Latin, mixed SBCS/DBCS)
    IBM_939,
}

impl Encoding {
    /// Every destination encoding in report order
    pub const ALL: [Encoding; 9] = [
        Encoding::ISO_2022_JP,
        Encoding::EUC_JP,
        Encoding::SHIFT_JIS,
        Encoding::SHIFT_JIS_2004,
        Encoding::WINDOWS_31J,
        Encoding::IBM_942,
        Encoding::IBM_943,
        Encoding::IBM_930,
        Encoding::IBM_939,
    ];

    /// Get the canonical name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::ISO_2022_JP => "ISO-2022-JP",
            Encoding::EUC_JP => "EUC-JP",
            Encoding::SHIFT_JIS => "Shift_JIS",
            Encoding::SHIFT_JIS_2004 => "Shift_JIS-2004",
            Encoding::WINDOWS_31J => "Windows-31J",
            Encoding::IBM_942 => "IBM-942",
            Encoding::IBM_943 => "IBM-943",
            Encoding::IBM_930 => "IBM-930",
            Encoding::IBM_939 => "IBM-939",
        }
    }

    /// Check if this encoding is an EBCDIC code page
    pub fn is_ebcdic(self) -> bool {
        matches!(self, Encoding::IBM_930 | Encoding::IBM_939)
    }

    /// Check if this encoding switches modes with escape or shift bytes
    pub fn is_stateful(self) -> bool {
        matches!(
            self,
            Encoding::ISO_2022_JP | Encoding::IBM_930 | Encoding::IBM_939
        )
    }

    /// Check if this encoding is an IBM code page, which is only present
    /// when a mapping table was configured
    pub fn is_code_page(self) -> bool {
        matches!(
            self,
            Encoding::IBM_942 | Encoding::IBM_943 | Encoding::IBM_930 | Encoding::IBM_939
        )
    }

    /// Byte written in place of a character the encoding cannot represent
    pub fn substitution(self) -> u8 {
        if self.is_ebcdic() { 0x6F } else { 0x3F }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Upper-case hex rendering of a byte sequence
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Upper-case UTF-16 code unit rendering of a string
pub fn utf16_hex(s: &str) -> String {
    s.encode_utf16().map(|u| format!("{:04X}", u)).collect()
}
