//! Table-driven codecs for encodings `encoding_rs` does not provide
//!
//! [`TableCodec`] handles the ASCII-based double-byte encodings (Shift_JIS-2004,
//! IBM-942, IBM-943). [`EbcdicCodec`] handles the mixed EBCDIC code pages, where
//! double-byte runs are framed by shift-out and shift-in.

use crate::codec::{Codec, REPLACEMENT};
use crate::tables::MappingTable;
use crate::Encoding;

/// Shift-out: enter double-byte mode
pub const SO: u8 = 0x0E;
/// Shift-in: return to single-byte mode
pub const SI: u8 = 0x0F;

/// Stateless codec over a [`MappingTable`]
pub struct TableCodec {
    encoding: Encoding,
    table: MappingTable,
}

impl TableCodec {
    /// Create a codec for `encoding` backed by `table`
    pub fn new(encoding: Encoding, table: MappingTable) -> Self {
        Self { encoding, table }
    }

    /// The backing table
    pub fn table(&self) -> &MappingTable {
        &self.table
    }
}

impl Codec for TableCodec {
    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            match self.table.encode_prefix(rest) {
                Some((bytes, read)) => {
                    out.extend_from_slice(bytes);
                    rest = &rest[read..];
                }
                None => {
                    out.push(self.encoding.substitution());
                    rest = &rest[c.len_utf8()..];
                }
            }
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            match self.table.decode_prefix(&bytes[i..]) {
                Some((text, read)) => {
                    out.push_str(text);
                    i += read;
                }
                None => {
                    out.push(REPLACEMENT);
                    // an unmapped pair is one malformed character
                    i += if self.table.is_lead(bytes[i]) && i + 1 < bytes.len() {
                        2
                    } else {
                        1
                    };
                }
            }
        }
        out
    }
}

/// Stateful EBCDIC codec with SO/SI framed double-byte runs
pub struct EbcdicCodec {
    encoding: Encoding,
    table: MappingTable,
}

impl EbcdicCodec {
    /// Create a codec for `encoding` backed by `table`, whose double-byte
    /// entries are stored without SO/SI
    pub fn new(encoding: Encoding, table: MappingTable) -> Self {
        Self { encoding, table }
    }
}

impl Codec for EbcdicCodec {
    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() + 2);
        let mut double = false;
        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            let (bytes, read): (&[u8], usize) = match self.table.encode_prefix(rest) {
                Some(found) => found,
                None => (&[], c.len_utf8()),
            };
            let wants_double = bytes.len() == 2;
            if wants_double != double {
                out.push(if wants_double { SO } else { SI });
                double = wants_double;
            }
            if bytes.is_empty() {
                out.push(self.encoding.substitution());
            } else {
                out.extend_from_slice(bytes);
            }
            rest = &rest[read..];
        }
        if double {
            out.push(SI);
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut double = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                SO => {
                    double = true;
                    i += 1;
                }
                SI => {
                    double = false;
                    i += 1;
                }
                _ if double => {
                    let decoded = bytes
                        .get(i..i + 2)
                        .and_then(|pair| self.table.decode_exact(pair));
                    out.push_str(decoded.unwrap_or("\u{FFFD}"));
                    i += 2;
                }
                b => {
                    out.push_str(self.table.decode_exact(&[b]).unwrap_or("\u{FFFD}"));
                    i += 1;
                }
            }
        }
        out
    }
}

/// Check if `bytes` is exactly one SO-framed double-byte character
pub fn is_ebcdic_kanji(bytes: &[u8]) -> bool {
    bytes.len() == 4 && bytes[0] == SO && bytes[3] == SI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::Direction;

    fn ebcdic_table() -> MappingTable {
        let mut table = MappingTable::new();
        table.insert(vec![0xC1], "A".to_string(), Direction::Both);
        table.insert(vec![0x40], " ".to_string(), Direction::Both);
        table.insert(vec![0x45, 0x41], "亜".to_string(), Direction::Both);
        table.insert(vec![0x40, 0x40], "\u{3000}".to_string(), Direction::Both);
        table
    }

    #[test]
    fn test_table_codec() {
        let mut table = MappingTable::new();
        table.insert(vec![0x41], "A".to_string(), Direction::Both);
        table.insert(vec![0x88, 0x9F], "亜".to_string(), Direction::Both);
        table.insert(vec![0x82, 0xF5], "\u{304B}\u{309A}".to_string(), Direction::Both);
        let codec = TableCodec::new(Encoding::SHIFT_JIS_2004, table);
        assert_eq!(codec.encode("A亜"), vec![0x41, 0x88, 0x9F]);
        assert_eq!(codec.encode("\u{304B}\u{309A}"), vec![0x82, 0xF5]);
        assert_eq!(codec.encode("B"), vec![0x3F]);
        assert_eq!(codec.decode(&[0x88, 0x9F, 0x41]), "亜A");
        assert_eq!(codec.decode(&[0x88, 0xA0, 0x41]), "\u{FFFD}A");
    }

    #[test]
    fn test_ebcdic_framing() {
        let codec = EbcdicCodec::new(Encoding::IBM_930, ebcdic_table());
        assert_eq!(codec.encode("亜"), vec![SO, 0x45, 0x41, SI]);
        assert_eq!(codec.encode("A亜A"), vec![0xC1, SO, 0x45, 0x41, SI, 0xC1]);
        assert_eq!(codec.encode("亜B"), vec![SO, 0x45, 0x41, SI, 0x6F]);
        assert!(is_ebcdic_kanji(&codec.encode("亜")));
        assert!(!is_ebcdic_kanji(&codec.encode("A")));
    }

    #[test]
    fn test_ebcdic_decode_modes() {
        let codec = EbcdicCodec::new(Encoding::IBM_939, ebcdic_table());
        assert_eq!(codec.decode(&[0x40, SO, 0x40, 0x40, SI, 0x40]), " \u{3000} ");
        assert_eq!(codec.decode(&[SO, 0x45, 0x41, SI]), "亜");
        assert_eq!(codec.decode(&[SO, 0x45]), "\u{FFFD}");
    }
}
