//! Destination encodings
//!
//! Every encoding a record is mapped into implements [`Codec`]. Encoders never
//! fail: a character the encoding cannot represent becomes the encoding's
//! substitution byte, and decoders turn malformed input into U+FFFD. The
//! fidelity checker relies on both properties.

use std::collections::{BTreeMap, HashMap};

use encoding_rs::{EncoderResult, EUC_JP, SHIFT_JIS};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::iso2022::Iso2022Jp;
use crate::kuten::{self, Kuten};
use crate::multibyte::{EbcdicCodec, TableCodec};
use crate::tables::{Direction, MappingTable};
use crate::Encoding;

/// Replacement character produced by every decoder
pub const REPLACEMENT: char = '\u{FFFD}';

/// A destination encoding
pub trait Codec: Send + Sync {
    /// Which encoding this codec implements
    fn encoding(&self) -> Encoding;

    /// Encode `text`, substituting unmappable characters
    fn encode(&self, text: &str) -> Vec<u8>;

    /// Decode `bytes`, replacing malformed sequences with U+FFFD
    fn decode(&self, bytes: &[u8]) -> String;
}

/// Encode with an `encoding_rs` encoder, writing `substitution` for every
/// character that is unmappable or rejected by `reject`
pub(crate) fn encode_substituting(
    encoding: &'static encoding_rs::Encoding,
    text: &str,
    substitution: u8,
    reject: impl Fn(char) -> bool,
) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len() + 4);
    let mut rest = text;
    while !rest.is_empty() {
        let run_end = rest
            .char_indices()
            .find(|&(_, c)| reject(c))
            .map_or(rest.len(), |(i, _)| i);
        let mut run = &rest[..run_end];
        while !run.is_empty() {
            let needed = encoder
                .max_buffer_length_from_utf8_without_replacement(run.len())
                .unwrap_or(run.len() * 4);
            out.reserve(needed);
            let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(run, &mut out, false);
            run = &run[read..];
            if let EncoderResult::Unmappable(_) = result {
                out.push(substitution);
            }
        }
        rest = &rest[run_end..];
        if let Some(c) = rest.chars().next() {
            out.push(substitution);
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

/// Windows-31J (Microsoft code page 932)
#[derive(Debug, Clone, Copy, Default)]
pub struct Windows31j;

impl Codec for Windows31j {
    fn encoding(&self) -> Encoding {
        Encoding::WINDOWS_31J
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        // encoding_rs folds U+2212 into U+FF0D; code page 932 has no such fallback
        encode_substituting(SHIFT_JIS, text, Encoding::WINDOWS_31J.substitution(), |c| {
            c == '\u{2212}'
        })
    }

    fn decode(&self, bytes: &[u8]) -> String {
        SHIFT_JIS.decode_without_bom_handling(bytes).0.into_owned()
    }
}

/// Positions where JIS X 0208 and Windows-31J assign different characters,
/// with the JIS assignment
pub const JIS_X0208_ASSIGNMENTS: [(Kuten, char); 7] = [
    (Kuten::new(1, 29), '\u{2014}'),
    (Kuten::new(1, 33), '\u{301C}'),
    (Kuten::new(1, 34), '\u{2016}'),
    (Kuten::new(1, 61), '\u{2212}'),
    (Kuten::new(1, 81), '\u{00A2}'),
    (Kuten::new(1, 82), '\u{00A3}'),
    (Kuten::new(2, 44), '\u{00AC}'),
];

/// The Windows-31J assignments of the same positions, which strict
/// Shift_JIS does not encode
const WINDOWS_ASSIGNMENTS: [char; 7] = [
    '\u{2015}', '\u{FF5E}', '\u{2225}', '\u{FF0D}', '\u{FFE0}', '\u{FFE1}', '\u{FFE2}',
];

/// Check if a row holds JIS X 0208 characters
pub fn is_jis_x0208_row(row: u8) -> bool {
    (1..=8).contains(&row) || (16..=84).contains(&row)
}

/// Result of mapping one character into the JIS X 0201 / JIS X 0208 repertoire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mapped {
    /// JIS X 0201 byte
    Single(u8),
    /// JIS X 0208 coordinate
    Double(Kuten),
}

/// Shift_JIS restricted to JIS X 0201 and JIS X 0208
///
/// Built on the Windows-31J tables with the vendor rows removed and the seven
/// standard assignments restored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftJis;

impl ShiftJis {
    /// Character at a JIS X 0208 coordinate
    pub(crate) fn decode_kuten(&self, row: u8, col: u8) -> Option<char> {
        if !is_jis_x0208_row(row) || !(1..=94).contains(&col) {
            return None;
        }
        if let Some(&(_, c)) = JIS_X0208_ASSIGNMENTS
            .iter()
            .find(|(k, _)| *k == Kuten::new(row, col))
        {
            return Some(c);
        }
        let sjis = kuten::kuten_to_shift_jis(row, col).ok()?;
        let bytes = kuten::to_bytes(sjis, 2);
        let decoded = SHIFT_JIS.decode_without_bom_handling(&bytes).0;
        let mut chars = decoded.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c != REPLACEMENT => Some(c),
            _ => None,
        }
    }

    fn decode_pair(&self, lead: u8, trail: u8) -> Option<char> {
        let mk = kuten::shift_jis_2004_to_kuten([lead, trail]).ok()?;
        if mk.plane != 1 {
            return None;
        }
        self.decode_kuten(mk.row, mk.col)
    }

    /// Map one character into JIS X 0201 or JIS X 0208
    pub(crate) fn map_char(&self, c: char) -> Option<Mapped> {
        match c {
            '\0'..='\x7F' => return Some(Mapped::Single(c as u8)),
            '\u{A5}' => return Some(Mapped::Single(0x5C)),
            '\u{203E}' => return Some(Mapped::Single(0x7E)),
            '\u{FF61}'..='\u{FF9F}' => {
                return Some(Mapped::Single((c as u32 - 0xFF61 + 0xA1) as u8));
            }
            _ => {}
        }
        if WINDOWS_ASSIGNMENTS.contains(&c) {
            return None;
        }
        if let Some(&(k, _)) = JIS_X0208_ASSIGNMENTS.iter().find(|(_, j)| *j == c) {
            return Some(Mapped::Double(k));
        }
        let mut buf = [0u8; 4];
        let (bytes, _, unmappable) = SHIFT_JIS.encode(c.encode_utf8(&mut buf));
        if unmappable || bytes.len() != 2 {
            return None;
        }
        let mk = kuten::shift_jis_2004_to_kuten([bytes[0], bytes[1]]).ok()?;
        (mk.plane == 1 && is_jis_x0208_row(mk.row)).then(|| Mapped::Double(mk.kuten()))
    }
}

impl Codec for ShiftJis {
    fn encoding(&self) -> Encoding {
        Encoding::SHIFT_JIS
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            match self.map_char(c) {
                Some(Mapped::Single(b)) => out.push(b),
                Some(Mapped::Double(k)) => match kuten::kuten_to_shift_jis(k.row, k.col) {
                    Ok(sjis) => out.extend(kuten::to_bytes(sjis, 2)),
                    Err(_) => out.push(Encoding::SHIFT_JIS.substitution()),
                },
                None => out.push(Encoding::SHIFT_JIS.substitution()),
            }
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                0x00..=0x7F => {
                    out.push(b as char);
                    i += 1;
                }
                0xA1..=0xDF => {
                    out.push(char::from_u32(0xFF61 + (b - 0xA1) as u32).unwrap_or(REPLACEMENT));
                    i += 1;
                }
                0x81..=0x9F | 0xE0..=0xEF if i + 1 < bytes.len() => {
                    out.push(self.decode_pair(b, bytes[i + 1]).unwrap_or(REPLACEMENT));
                    i += 2;
                }
                _ => {
                    out.push(REPLACEMENT);
                    i += 1;
                }
            }
        }
        out
    }
}

/// JIS X 0212 characters keyed both ways by their two EUC-JP bytes after `0x8F`
pub(crate) struct Jis0212Index {
    decode: HashMap<[u8; 2], char>,
    encode: HashMap<char, [u8; 2]>,
}

impl Jis0212Index {
    fn build() -> Self {
        let mut decode = HashMap::new();
        let mut encode = HashMap::new();
        for b1 in 0xA1..=0xFEu8 {
            for b2 in 0xA1..=0xFEu8 {
                let bytes = [0x8F, b1, b2];
                let decoded = EUC_JP.decode_without_bom_handling(&bytes).0;
                let mut chars = decoded.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    if c != REPLACEMENT {
                        decode.insert([b1, b2], c);
                        encode.entry(c).or_insert([b1, b2]);
                    }
                }
            }
        }
        debug!(entries = decode.len(), "built JIS X 0212 index");
        Self { decode, encode }
    }

    /// Character for the two bytes following `0x8F`
    pub(crate) fn decode(&self, bytes: [u8; 2]) -> Option<char> {
        self.decode.get(&bytes).copied()
    }

    /// The two bytes following `0x8F` for a character
    pub(crate) fn encode(&self, c: char) -> Option<[u8; 2]> {
        self.encode.get(&c).copied()
    }
}

static JIS_X0212: Lazy<Jis0212Index> = Lazy::new(Jis0212Index::build);

pub(crate) fn jis_x0212() -> &'static Jis0212Index {
    &JIS_X0212
}

/// EUC-JP with JIS X 0201, JIS X 0208 and JIS X 0212
///
/// JIS X 0208 uses the same repertoire as [`ShiftJis`]; a character missing
/// there falls back to JIS X 0212.
#[derive(Debug, Clone, Copy, Default)]
pub struct EucJp;

impl Codec for EucJp {
    fn encoding(&self) -> Encoding {
        Encoding::EUC_JP
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            match ShiftJis.map_char(c) {
                Some(Mapped::Single(b)) if b < 0x80 => out.push(b),
                Some(Mapped::Single(b)) => out.extend_from_slice(&[0x8E, b]),
                Some(Mapped::Double(k)) => out.extend_from_slice(&[k.row + 0xA0, k.col + 0xA0]),
                None => match jis_x0212().encode(c) {
                    Some([b1, b2]) => out.extend_from_slice(&[0x8F, b1, b2]),
                    None => out.push(Encoding::EUC_JP.substitution()),
                },
            }
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut i = 0;
        let is_gr = |b: &u8| (0xA1..=0xFE).contains(b);
        while i < bytes.len() {
            let b = bytes[i];
            let next = bytes.get(i + 1);
            match b {
                0x00..=0x7F => {
                    out.push(b as char);
                    i += 1;
                }
                0x8E if next.is_some_and(|b2| (0xA1..=0xDF).contains(b2)) => {
                    let b2 = bytes[i + 1];
                    out.push(char::from_u32(0xFF61 + (b2 - 0xA1) as u32).unwrap_or(REPLACEMENT));
                    i += 2;
                }
                0x8F if next.is_some_and(is_gr) && bytes.get(i + 2).is_some_and(is_gr) => {
                    let pair = [bytes[i + 1], bytes[i + 2]];
                    out.push(jis_x0212().decode(pair).unwrap_or(REPLACEMENT));
                    i += 3;
                }
                0xA1..=0xFE if next.is_some_and(is_gr) => {
                    let decoded = ShiftJis.decode_kuten(b - 0xA0, bytes[i + 1] - 0xA0);
                    out.push(decoded.unwrap_or(REPLACEMENT));
                    i += 2;
                }
                _ => {
                    out.push(REPLACEMENT);
                    i += 1;
                }
            }
        }
        out
    }
}

/// JIS X 0201 and JIS X 0208 as a mapping table, in the Shift_JIS-2004 byte
/// layout. Stands in for a Shift_JIS-2004 table when none is configured.
pub fn jis_x0208_subset() -> MappingTable {
    let mut table = MappingTable::new();
    for b in 0x00..=0x7Fu8 {
        let text = match b {
            0x5C => '\u{A5}',
            0x7E => '\u{203E}',
            _ => b as char,
        };
        table.insert(vec![b], text.to_string(), Direction::Both);
    }
    for b in 0xA1..=0xDFu8 {
        if let Some(c) = char::from_u32(0xFF61 + (b - 0xA1) as u32) {
            table.insert(vec![b], c.to_string(), Direction::Both);
        }
    }
    for row in (1..=94u8).filter(|&r| is_jis_x0208_row(r)) {
        for col in 1..=94u8 {
            if let (Some(c), Ok(sjis)) = (
                ShiftJis.decode_kuten(row, col),
                kuten::kuten_to_shift_jis(row, col),
            ) {
                table.insert(kuten::to_bytes(sjis, 2), c.to_string(), Direction::Both);
            }
        }
    }
    table
}

/// The codecs of one run, one per configured encoding
pub struct CodecSet {
    codecs: BTreeMap<Encoding, Box<dyn Codec>>,
}

impl CodecSet {
    /// Codecs that need no mapping files. Shift_JIS-2004 is backed by
    /// [`jis_x0208_subset`] and the IBM code pages are absent.
    pub fn builtin() -> Self {
        let mut set = Self {
            codecs: BTreeMap::new(),
        };
        set.insert(Box::new(Iso2022Jp));
        set.insert(Box::new(EucJp));
        set.insert(Box::new(ShiftJis));
        set.insert(Box::new(TableCodec::new(
            Encoding::SHIFT_JIS_2004,
            jis_x0208_subset(),
        )));
        set.insert(Box::new(Windows31j));
        set
    }

    /// Register a codec, replacing any codec for the same encoding
    pub fn insert(&mut self, codec: Box<dyn Codec>) {
        self.codecs.insert(codec.encoding(), codec);
    }

    /// Register a table-driven codec for `encoding`, framed with SO/SI
    /// for the EBCDIC code pages
    pub fn with_table(mut self, encoding: Encoding, table: MappingTable) -> Self {
        if encoding.is_ebcdic() {
            self.insert(Box::new(EbcdicCodec::new(encoding, table)));
        } else {
            self.insert(Box::new(TableCodec::new(encoding, table)));
        }
        self
    }

    /// The codec for `encoding`, if configured
    pub fn get(&self, encoding: Encoding) -> Option<&dyn Codec> {
        self.codecs.get(&encoding).map(|c| c.as_ref())
    }

    /// Check if `encoding` is configured
    pub fn contains(&self, encoding: Encoding) -> bool {
        self.codecs.contains_key(&encoding)
    }

    /// Configured encodings in report order
    pub fn encodings(&self) -> impl Iterator<Item = Encoding> + '_ {
        self.codecs.keys().copied()
    }

    /// Encode with the codec for `encoding`
    pub fn encode(&self, encoding: Encoding, text: &str) -> Option<Vec<u8>> {
        self.get(encoding).map(|c| c.encode(text))
    }

    /// Decode with the codec for `encoding`
    pub fn decode(&self, encoding: Encoding, bytes: &[u8]) -> Option<String> {
        self.get(encoding).map(|c| c.decode(bytes))
    }
}

impl Default for CodecSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows31j() {
        let codec = Windows31j;
        assert_eq!(codec.encode("亜"), vec![0x88, 0x9F]);
        assert_eq!(codec.encode("\u{FF5E}"), vec![0x81, 0x60]);
        assert_eq!(codec.encode("①"), vec![0x87, 0x40]);
        assert_eq!(codec.encode("\u{301C}"), vec![0x3F]);
        assert_eq!(codec.encode("\u{2212}"), vec![0x3F]);
        assert_eq!(codec.encode("a\u{20B9F}b"), vec![b'a', 0x3F, b'b']);
        assert_eq!(codec.decode(&[0x81, 0x60]), "\u{FF5E}");
        assert_eq!(codec.decode(&[0xFA, 0x40]), "ⅰ");
    }

    #[test]
    fn test_strict_shift_jis_assignments() {
        let codec = ShiftJis;
        assert_eq!(codec.decode(&[0x81, 0x60]), "\u{301C}");
        assert_eq!(codec.decode(&[0x81, 0xCA]), "\u{00AC}");
        assert_eq!(codec.decode(&[0x81, 0x5C]), "\u{2014}");
        assert_eq!(codec.encode("\u{301C}"), vec![0x81, 0x60]);
        assert_eq!(codec.encode("\u{00AC}"), vec![0x81, 0xCA]);
        assert_eq!(codec.encode("\u{FF5E}"), vec![0x3F]);
        assert_eq!(codec.encode("\u{FFE2}"), vec![0x3F]);
    }

    #[test]
    fn test_strict_shift_jis_excludes_vendor_rows() {
        let codec = ShiftJis;
        assert_eq!(codec.decode(&[0x87, 0x40]), "\u{FFFD}");
        // 0xFA is not a lead byte, so the trail decodes on its own
        assert_eq!(codec.decode(&[0xFA, 0x40]), "\u{FFFD}@");
        assert_eq!(codec.decode(&[0x80]), "\u{FFFD}");
        assert_eq!(codec.decode(&[0xA0]), "\u{FFFD}");
        assert_eq!(codec.encode("①"), vec![0x3F]);
        assert_eq!(codec.encode("ⅰ"), vec![0x3F]);
        assert_eq!(codec.encode("亜"), vec![0x88, 0x9F]);
    }

    #[test]
    fn test_strict_shift_jis_single_bytes() {
        let codec = ShiftJis;
        assert_eq!(codec.encode("\u{A5}\u{203E}"), vec![0x5C, 0x7E]);
        assert_eq!(codec.encode("\\~"), vec![0x5C, 0x7E]);
        assert_eq!(codec.decode(&[0x5C, 0xB1]), "\\ｱ");
        assert_eq!(codec.encode("ｱ"), vec![0xB1]);
    }

    #[test]
    fn test_euc_jp() {
        let codec = EucJp;
        assert_eq!(codec.encode("亜"), vec![0xB0, 0xA1]);
        assert_eq!(codec.encode("ｱ"), vec![0x8E, 0xB1]);
        assert_eq!(codec.encode("\u{301C}"), vec![0xA1, 0xC1]);
        assert_eq!(codec.decode(&[0xA1, 0xC1]), "\u{301C}");
        assert_eq!(codec.decode(&[0x8E, 0xB1]), "ｱ");
        assert_eq!(codec.encode("①"), vec![0x3F]);
    }

    #[test]
    fn test_euc_jp_supplementary_kanji() {
        let codec = EucJp;
        // 0x8FB0A1 is the first JIS X 0212 kanji
        let decoded = codec.decode(&[0x8F, 0xB0, 0xA1]);
        assert_eq!(decoded, "丂");
        assert_eq!(codec.encode(&decoded), vec![0x8F, 0xB0, 0xA1]);
        assert_eq!(codec.decode(&[0x8F, 0xA1]), "\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_jis_x0208_subset() {
        let table = jis_x0208_subset();
        assert_eq!(table.decode_prefix(&[0x5C]), Some(("\u{A5}", 1)));
        assert_eq!(table.decode_prefix(&[0x81, 0x60]), Some(("\u{301C}", 2)));
        assert_eq!(table.decode_prefix(&[0x87, 0x40]), None);
    }

    #[test]
    fn test_builtin_codec_set() {
        let set = CodecSet::builtin();
        let encodings: Vec<_> = set.encodings().collect();
        assert_eq!(
            encodings,
            vec![
                Encoding::ISO_2022_JP,
                Encoding::EUC_JP,
                Encoding::SHIFT_JIS,
                Encoding::SHIFT_JIS_2004,
                Encoding::WINDOWS_31J,
            ]
        );
        assert!(!set.contains(Encoding::IBM_943));
        assert_eq!(set.encode(Encoding::SHIFT_JIS_2004, "亜"), Some(vec![0x88, 0x9F]));
        assert_eq!(set.decode(Encoding::IBM_930, &[0x45, 0x41]), None);
    }
}
