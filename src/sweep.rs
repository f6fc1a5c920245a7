//! Full sweep over the fixed coordinate space
//!
//! [`Sweep::run`] visits every position of every table once, in section order,
//! and yields one [`Entry`] per record.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::codec::{CodecSet, JIS_X0208_ASSIGNMENTS};
use crate::exceptions::ExceptionTables;
use crate::fidelity::FidelityReport;
use crate::kubun::{Classifier, ClassifierOptions, Kubun, USER_DEFINED_ROWS};
use crate::record::{CharRecord, Coordinate, RecordBuilder, RecordKind};
use crate::Result;

/// COMBINING KATAKANA-HIRAGANA (SEMI-)VOICED SOUND MARK
pub const COMBINING_MARKS: [char; 2] = ['\u{3099}', '\u{309A}'];

/// Block of the sweep an entry belongs to, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    /// Bytes 0x00 to 0x7F
    Ascii,
    /// Bytes 0x80 to 0xFF
    JisX0201,
    /// Positions where JIS X 0208 and Windows-31J disagree
    DifferingMappings,
    /// Windows-31J rows 1 to 12
    NonKanji,
    /// Windows-31J rows 13 to 15
    NecSpecial,
    /// Windows-31J rows 16 to 47
    Level1,
    /// Windows-31J rows 48 to 88
    Level2,
    /// Windows-31J rows 89 to 94
    NecSelectedIbm,
    /// Windows-31J rows 95 to 114
    UserDefined,
    /// Windows-31J rows 115 to 120
    IbmExtension,
    /// JIS X 0213 plane 1 rows 2 to 13
    Jis0213NonKanji,
    /// JIS X 0213 plane 1 level 3 kanji
    Jis0213Level3,
    /// JIS X 0213 plane 2
    Jis0213Level4,
    /// Standalone combining marks
    Combining,
    /// JIS X 0212 non-kanji rows
    Jis0212NonKanji,
    /// JIS X 0212 supplementary kanji
    Jis0212Kanji,
}

impl Section {
    /// Section of a Windows-31J row
    pub fn for_row(row: u8) -> Section {
        match row {
            ..=12 => Section::NonKanji,
            ..=15 => Section::NecSpecial,
            ..=47 => Section::Level1,
            ..=88 => Section::Level2,
            ..=94 => Section::NecSelectedIbm,
            ..=114 => Section::UserDefined,
            _ => Section::IbmExtension,
        }
    }

    /// Section of a JIS X 0213 row
    pub fn for_jis0213(plane: u8, row: u8) -> Section {
        match (plane, row) {
            (2, _) => Section::Jis0213Level4,
            (_, ..=13) => Section::Jis0213NonKanji,
            _ => Section::Jis0213Level3,
        }
    }

    /// Section of a JIS X 0212 row
    pub fn for_jis0212(row: u8) -> Section {
        if row < 16 {
            Section::Jis0212NonKanji
        } else {
            Section::Jis0212Kanji
        }
    }
}

/// Which optional blocks a sweep includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepOptions {
    /// Emit the JIS X 0208 / Windows-31J differing-mapping pairs
    pub differing_mappings: bool,
    /// Emit Windows-31J rows 89 to 114
    pub vendor_blocks: bool,
    /// Emit JIS X 0212
    pub jis_x0212: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            differing_mappings: true,
            vendor_blocks: true,
            jis_x0212: true,
        }
    }
}

/// One output row: a record with its fidelity report and classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Block the record came from
    pub section: Section,
    /// Position of the record
    pub coordinate: Coordinate,
    /// The record
    pub record: CharRecord,
    /// Per-encoding fidelity
    pub fidelity: FidelityReport,
    /// Classification code
    pub kubun: Kubun,
}

/// Sweeps the coordinate space with one set of codecs and tables
pub struct Sweep<'a> {
    builder: RecordBuilder<'a>,
    classifier: Classifier<'a>,
    options: SweepOptions,
}

impl<'a> Sweep<'a> {
    /// Create a sweep
    pub fn new(
        codecs: &'a CodecSet,
        tables: &'a ExceptionTables,
        classifier: ClassifierOptions,
        options: SweepOptions,
    ) -> Self {
        Self {
            builder: RecordBuilder::new(codecs, tables),
            classifier: Classifier::new(&tables.kanji, classifier),
            options,
        }
    }

    /// The record builder in use
    pub fn builder(&self) -> &RecordBuilder<'a> {
        &self.builder
    }

    /// Check and classify one record
    pub fn entry(&self, section: Section, record: CharRecord) -> Entry {
        let fidelity = FidelityReport::check(&record, self.builder.codecs());
        let kubun = self.classifier.classify(&record, &fidelity);
        trace!(%section, coordinate = %record.coordinate(), %kubun, "entry");
        Entry {
            section,
            coordinate: record.coordinate(),
            record,
            fidelity,
            kubun,
        }
    }

    /// Entries of one JIS X 0201 byte
    pub fn single_byte(&self, byte: u8) -> Vec<Entry> {
        let section = if byte < 0x80 {
            Section::Ascii
        } else {
            Section::JisX0201
        };
        self.builder
            .single_byte(byte)
            .into_iter()
            .map(|r| self.entry(section, r))
            .collect()
    }

    /// Entries of one Windows-31J position
    pub fn double_byte(&self, row: u8, col: u8) -> Result<Vec<Entry>> {
        let section = Section::for_row(row);
        Ok(self
            .builder
            .double_byte(row, col)?
            .into_iter()
            .map(|r| self.entry(section, r))
            .collect())
    }

    /// Entry of one JIS X 0213 position, or `None` when the character is
    /// undefined or already covered by JIS X 0208
    pub fn jis0213(&self, plane: u8, row: u8, col: u8) -> Result<Option<Entry>> {
        let record = self.builder.jis0213(plane, row, col)?;
        let RecordKind::Jis0213 { strict, .. } = &record.kind else {
            return Ok(None);
        };
        if record.is_undefined() || *strict == record.canonical {
            return Ok(None);
        }
        Ok(Some(self.entry(Section::for_jis0213(plane, row), record)))
    }

    /// Entry of one JIS X 0212 position, or `None` when undefined
    pub fn jis0212(&self, row: u8, col: u8) -> Result<Option<Entry>> {
        let record = self.builder.jis0212(row, col)?;
        if record.is_undefined() {
            return Ok(None);
        }
        Ok(Some(self.entry(Section::for_jis0212(row), record)))
    }

    /// Visit every position in section order
    pub fn run(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();

        for byte in 0x00..=0xFFu8 {
            entries.extend(self.single_byte(byte));
        }

        if self.options.differing_mappings {
            for (kuten, _) in JIS_X0208_ASSIGNMENTS {
                let pair = [
                    self.builder.jis_x0208(kuten.row, kuten.col)?,
                    self.builder.windows_31j(kuten.row, kuten.col)?,
                ];
                entries.extend(pair.map(|r| self.entry(Section::DifferingMappings, r)));
            }
        }

        for row in 1..=120u8 {
            let vendor_row = (89..=94).contains(&row) || USER_DEFINED_ROWS.contains(&row);
            if vendor_row && !self.options.vendor_blocks {
                continue;
            }
            for col in 1..=94u8 {
                entries.extend(self.double_byte(row, col)?);
            }
        }

        let level3_rows = (14..=94u8).filter(|r| !(16..=46).contains(r) && !(48..=83).contains(r));
        let plane1_rows = (2..=13u8).chain(level3_rows).map(|r| (1, r));
        let plane2_rows = (1..=94u8).map(|r| (2, r));
        for (plane, row) in plane1_rows.chain(plane2_rows) {
            for col in 1..=94u8 {
                match self.jis0213(plane, row, col) {
                    Ok(entry) => entries.extend(entry),
                    Err(e) if e.is_skip() => break,
                    Err(e) => return Err(e),
                }
            }
        }

        for mark in COMBINING_MARKS {
            entries.push(self.entry(Section::Combining, self.builder.combining(mark)));
        }

        if self.options.jis_x0212 {
            let rows = [2u8, 6, 7, 9, 10, 11].into_iter().chain(16..=77);
            for row in rows {
                for col in 1..=94u8 {
                    entries.extend(self.jis0212(row, col)?);
                }
            }
        }

        debug!(entries = entries.len(), "sweep finished");
        Ok(entries)
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Ascii => "ascii",
            Section::JisX0201 => "jis-x0201",
            Section::DifferingMappings => "differing-mappings",
            Section::NonKanji => "non-kanji",
            Section::NecSpecial => "nec-special",
            Section::Level1 => "level-1",
            Section::Level2 => "level-2",
            Section::NecSelectedIbm => "nec-selected-ibm",
            Section::UserDefined => "user-defined",
            Section::IbmExtension => "ibm-extension",
            Section::Jis0213NonKanji => "jis0213-non-kanji",
            Section::Jis0213Level3 => "jis0213-level-3",
            Section::Jis0213Level4 => "jis0213-level-4",
            Section::Combining => "combining",
            Section::Jis0212NonKanji => "jis0212-non-kanji",
            Section::Jis0212Kanji => "jis0212-kanji",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_rows() {
        assert_eq!(Section::for_row(1), Section::NonKanji);
        assert_eq!(Section::for_row(13), Section::NecSpecial);
        assert_eq!(Section::for_row(16), Section::Level1);
        assert_eq!(Section::for_row(88), Section::Level2);
        assert_eq!(Section::for_row(92), Section::NecSelectedIbm);
        assert_eq!(Section::for_row(95), Section::UserDefined);
        assert_eq!(Section::for_row(120), Section::IbmExtension);
        assert_eq!(Section::for_jis0213(1, 3), Section::Jis0213NonKanji);
        assert_eq!(Section::for_jis0213(1, 14), Section::Jis0213Level3);
        assert_eq!(Section::for_jis0213(2, 1), Section::Jis0213Level4);
        assert_eq!(Section::for_jis0212(9), Section::Jis0212NonKanji);
    }

    #[test]
    fn test_jis0213_filters_jis_x0208_duplicates() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let sweep = Sweep::new(&codecs, &tables, Default::default(), Default::default());
        // with the derived table every plane 1 character is also in JIS X 0208
        assert_eq!(sweep.jis0213(1, 16, 1).unwrap(), None);
        assert_eq!(sweep.jis0213(1, 14, 1).unwrap(), None);
        assert!(sweep.jis0213(2, 16, 1).unwrap_err().is_skip());
    }

    #[test]
    fn test_jis0212_entries() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let sweep = Sweep::new(&codecs, &tables, Default::default(), Default::default());
        let entry = sweep.jis0212(16, 1).unwrap().unwrap();
        assert_eq!(entry.section, Section::Jis0212Kanji);
        assert_eq!(entry.coordinate.to_string(), "2-16-01");
        assert_eq!(&entry.kubun.to_string()[2..3], "5");
        assert_eq!(sweep.jis0212(1, 1).unwrap(), None);
    }

    #[test]
    fn test_single_byte_entries() {
        let codecs = CodecSet::builtin();
        let tables = ExceptionTables::default();
        let sweep = Sweep::new(&codecs, &tables, Default::default(), Default::default());
        let entries = sweep.single_byte(0x7E);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.coordinate == Coordinate::Byte(0x7E)));
        assert_eq!(entries[1].record.canonical, "\u{203E}");
        assert_eq!(sweep.single_byte(0xB1)[0].section, Section::JisX0201);
    }
}
