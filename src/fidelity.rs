//! Round-trip fidelity per destination encoding

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::codec::CodecSet;
use crate::kuten::ESC;
use crate::multibyte::is_ebcdic_kanji;
use crate::record::{CharRecord, RecordKind};
use crate::Encoding;

/// How a character behaves when encoded and decoded again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fidelity {
    /// Encoding then decoding gives the character back
    RoundTrips,
    /// The character encodes, but the bytes decode to something else
    EncodeOnly,
    /// The bytes decode to the character, but the character does not encode
    /// to them
    DecodeOnly,
    /// Neither direction works
    Undefined,
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Fidelity::RoundTrips => "round-trips",
            Fidelity::EncodeOnly => "encode-only",
            Fidelity::DecodeOnly => "decode-only",
            Fidelity::Undefined => "undefined",
        })
    }
}

/// How encodability is judged for one encoding of one record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// The encoded bytes must equal the bytes that define the position
    Position,
    /// The encoded bytes must not contain the substitution marker
    Content,
}

impl Check {
    /// The check used for `encoding` on records of `kind`
    pub fn for_kind(kind: &RecordKind, encoding: Encoding) -> Check {
        match kind {
            RecordKind::Jis0212 { .. }
                if matches!(encoding, Encoding::EUC_JP | Encoding::SHIFT_JIS) =>
            {
                Check::Position
            }
            RecordKind::Jis0212 { .. } | RecordKind::Combining { .. } => Check::Content,
            _ if matches!(
                encoding,
                Encoding::SHIFT_JIS | Encoding::SHIFT_JIS_2004 | Encoding::WINDOWS_31J
            ) =>
            {
                Check::Position
            }
            _ => Check::Content,
        }
    }
}

/// Encodings whose byte layout the defining bytes of `kind` belong to
fn native_encodings(kind: &RecordKind) -> &'static [Encoding] {
    match kind {
        RecordKind::Jis0212 { .. } => &[Encoding::EUC_JP],
        RecordKind::Combining { .. } => &[],
        _ => &[
            Encoding::SHIFT_JIS,
            Encoding::SHIFT_JIS_2004,
            Encoding::WINDOWS_31J,
            Encoding::IBM_942,
            Encoding::IBM_943,
        ],
    }
}

/// Encodability and decodability of one record in one encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    /// The character encodes faithfully
    pub encodable: bool,
    /// The encoded bytes decode back to the character
    pub decodable: bool,
    /// The combined outcome
    pub outcome: Fidelity,
}

impl Verdict {
    const UNDEFINED: Verdict = Verdict {
        encodable: false,
        decodable: false,
        outcome: Fidelity::Undefined,
    };
}

/// Content check: the encoded bytes carry no substitution marker
fn content_is_clean(encoding: Encoding, canonical: &str, bytes: &[u8]) -> bool {
    if canonical == "?" || (encoding == Encoding::ISO_2022_JP && canonical == "\u{FF1F}") {
        return true;
    }
    match encoding {
        // inside a designation 0x3F is an ordinary byte; 0x2129 is the
        // double-byte question mark
        Encoding::ISO_2022_JP => {
            (!bytes.contains(&0x3F) || bytes.first() == Some(&ESC))
                && !bytes.windows(2).any(|w| w == [0x21, 0x29])
        }
        e if e.is_ebcdic() => !bytes.contains(&e.substitution()) || is_ebcdic_kanji(bytes),
        e => !bytes.contains(&e.substitution()),
    }
}

/// Per-encoding fidelity of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FidelityReport {
    verdicts: BTreeMap<Encoding, Verdict>,
}

impl FidelityReport {
    /// Check `record` against every codec it was encoded with
    pub fn check(record: &CharRecord, codecs: &CodecSet) -> Self {
        let verdicts = record
            .encoded
            .iter()
            .filter_map(|(&encoding, bytes)| {
                let codec = codecs.get(encoding)?;
                if record.is_undefined() {
                    return Some((encoding, Verdict::UNDEFINED));
                }
                let encodable = match Check::for_kind(&record.kind, encoding) {
                    Check::Position => *bytes == record.defining,
                    Check::Content => content_is_clean(encoding, &record.canonical, bytes),
                };
                let decodable = codec.decode(bytes) == record.canonical;
                let outcome = match (encodable, decodable) {
                    (true, true) => Fidelity::RoundTrips,
                    (true, false) => Fidelity::EncodeOnly,
                    (false, true) => Fidelity::DecodeOnly,
                    (false, false)
                        if !record.defining.is_empty()
                            && native_encodings(&record.kind).contains(&encoding)
                            && codec.decode(&record.defining) == record.canonical =>
                    {
                        Fidelity::DecodeOnly
                    }
                    (false, false) => Fidelity::Undefined,
                };
                Some((
                    encoding,
                    Verdict {
                        encodable,
                        decodable,
                        outcome,
                    },
                ))
            })
            .collect();
        Self { verdicts }
    }

    /// Verdict for `encoding`, if it was checked
    pub fn get(&self, encoding: Encoding) -> Option<&Verdict> {
        self.verdicts.get(&encoding)
    }

    /// Whether the record encodes faithfully in `encoding`; false when the
    /// encoding was not checked
    pub fn encodable(&self, encoding: Encoding) -> bool {
        self.get(encoding).is_some_and(|v| v.encodable)
    }

    /// Whether the record decodes back from `encoding`; false when the
    /// encoding was not checked
    pub fn decodable(&self, encoding: Encoding) -> bool {
        self.get(encoding).is_some_and(|v| v.decodable)
    }

    /// Outcome for `encoding`
    pub fn outcome(&self, encoding: Encoding) -> Option<Fidelity> {
        self.get(encoding).map(|v| v.outcome)
    }

    /// All verdicts in report order
    pub fn iter(&self) -> impl Iterator<Item = (Encoding, &Verdict)> {
        self.verdicts.iter().map(|(e, v)| (*e, v))
    }
}

impl Serialize for FidelityReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.verdicts.iter().map(|(e, v)| (e.name(), v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exceptions::ExceptionTables;
    use crate::record::RecordBuilder;
    use crate::tables::{Direction, MappingTable};

    fn report_for(records: &[CharRecord], codecs: &CodecSet) -> Vec<FidelityReport> {
        records.iter().map(|r| FidelityReport::check(r, codecs)).collect()
    }

    #[test]
    fn test_round_trip_kanji() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);
        let record = builder.windows_31j(16, 1).unwrap();
        let report = FidelityReport::check(&record, &codecs);
        for encoding in codecs.encodings() {
            assert_eq!(report.outcome(encoding), Some(Fidelity::RoundTrips), "{encoding}");
        }
    }

    #[test]
    fn test_differing_mapping_outcomes() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);
        let records = builder.double_byte(1, 33).unwrap();
        let reports = report_for(&records, &codecs);

        // U+301C: JIS reading
        assert_eq!(reports[0].outcome(Encoding::SHIFT_JIS), Some(Fidelity::RoundTrips));
        assert_eq!(reports[0].outcome(Encoding::EUC_JP), Some(Fidelity::RoundTrips));
        assert_eq!(reports[0].outcome(Encoding::WINDOWS_31J), Some(Fidelity::Undefined));
        // U+FF5E: Windows reading
        assert_eq!(reports[1].outcome(Encoding::WINDOWS_31J), Some(Fidelity::RoundTrips));
        assert_eq!(reports[1].outcome(Encoding::SHIFT_JIS), Some(Fidelity::Undefined));
    }

    #[test]
    fn test_decode_only_vendor_duplicate() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);
        // 89-01 is an NEC-selected IBM extension that encodes to its IBM
        // extension duplicate at 115-xx
        let record = builder.windows_31j(89, 1).unwrap();
        let report = FidelityReport::check(&record, &codecs);
        let verdict = report.get(Encoding::WINDOWS_31J).unwrap();
        assert!(!verdict.encodable);
        assert!(verdict.decodable);
        assert_eq!(verdict.outcome, Fidelity::DecodeOnly);
    }

    #[test]
    fn test_undefined_record() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);
        let record = builder.windows_31j(2, 15).unwrap();
        let report = FidelityReport::check(&record, &codecs);
        assert!(report.iter().all(|(_, v)| *v == Verdict::UNDEFINED));
        assert_eq!(report.iter().count(), 5);
    }

    #[test]
    fn test_round_trips_implies_both_checks() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);
        for row in [1, 2, 13, 16, 48, 89, 115] {
            for col in [1, 15, 44, 94] {
                for record in builder.double_byte(row, col).unwrap() {
                    let report = FidelityReport::check(&record, &codecs);
                    for (_, v) in report.iter() {
                        if v.outcome == Fidelity::RoundTrips {
                            assert!(v.encodable && v.decodable);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_jis0212_checks_per_encoding() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);
        let record = builder.jis0212(16, 1).unwrap();
        let report = FidelityReport::check(&record, &codecs);
        assert_eq!(report.outcome(Encoding::EUC_JP), Some(Fidelity::RoundTrips));
        // the three-byte EUC-JP form never equals a Shift_JIS encoding
        assert!(!report.encodable(Encoding::SHIFT_JIS));
        assert_eq!(report.outcome(Encoding::SHIFT_JIS), Some(Fidelity::Undefined));
    }

    #[test]
    fn test_configured_ebcdic_codec() {
        let mut table = MappingTable::new();
        // the trail byte 0x6F is also the single-byte substitution marker
        table.insert(vec![0x45, 0x6F], "亜".to_string(), Direction::Both);
        let codecs = CodecSet::builtin().with_table(Encoding::IBM_930, table);
        let tables = ExceptionTables::default();
        let builder = RecordBuilder::new(&codecs, &tables);

        let record = builder.windows_31j(16, 1).unwrap();
        assert_eq!(record.encoded(Encoding::IBM_930), Some(&[0x0E, 0x45, 0x6F, 0x0F][..]));
        let report = FidelityReport::check(&record, &codecs);
        assert!(report.encodable(Encoding::IBM_930));
        assert_eq!(report.outcome(Encoding::IBM_930), Some(Fidelity::RoundTrips));

        // 16-02 is not in the table
        let record = builder.windows_31j(16, 2).unwrap();
        assert_eq!(record.encoded(Encoding::IBM_930), Some(&[0x6F][..]));
        let report = FidelityReport::check(&record, &codecs);
        assert!(!report.encodable(Encoding::IBM_930));
        assert_eq!(report.outcome(Encoding::IBM_930), Some(Fidelity::Undefined));
        assert_eq!(report.outcome(Encoding::SHIFT_JIS), Some(Fidelity::RoundTrips));
    }

    #[test]
    fn test_question_mark_is_encodable() {
        assert!(content_is_clean(Encoding::EUC_JP, "?", b"?"));
        assert!(content_is_clean(Encoding::ISO_2022_JP, "\u{FF1F}", b"\x1B$B!)\x1B(B"));
        assert!(!content_is_clean(Encoding::ISO_2022_JP, "x", b"\x1B$B!)\x1B(B"));
        assert!(content_is_clean(Encoding::ISO_2022_JP, "x", b"\x1B$B?!\x1B(B"));
        assert!(!content_is_clean(Encoding::ISO_2022_JP, "x", b"?"));
        assert!(content_is_clean(Encoding::IBM_930, "x", &[0x0E, 0x6F, 0x41, 0x0F]));
        assert!(!content_is_clean(Encoding::IBM_930, "x", &[0x6F]));
    }

    #[test]
    fn test_check_kinds() {
        let jis0212 = RecordKind::Jis0212 {
            kuten: crate::Kuten::new(16, 1),
        };
        assert_eq!(Check::for_kind(&jis0212, Encoding::EUC_JP), Check::Position);
        assert_eq!(Check::for_kind(&jis0212, Encoding::SHIFT_JIS), Check::Position);
        assert_eq!(Check::for_kind(&jis0212, Encoding::SHIFT_JIS_2004), Check::Content);
        assert_eq!(Check::for_kind(&jis0212, Encoding::WINDOWS_31J), Check::Content);
        assert_eq!(Check::for_kind(&jis0212, Encoding::IBM_930), Check::Content);
        let single = RecordKind::SingleByte {
            byte: 0x41,
            alternate: false,
        };
        assert_eq!(Check::for_kind(&single, Encoding::SHIFT_JIS), Check::Position);
        assert_eq!(Check::for_kind(&single, Encoding::EUC_JP), Check::Content);
    }
}
