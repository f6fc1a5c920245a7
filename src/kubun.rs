//! Six-digit classification codes ("kubun")
//!
//! A [`Kubun`] holds one typed value per axis and renders to the digit string
//! only through `Display` and serialization. The axes, in digit order:
//!
//! 1. Unicode segment of the character
//! 2. Normalization delta
//! 3. Standard the position belongs to
//! 4. Kanji level within that standard
//! 5. Windows-31J region
//! 6. Kanji usage level
//!
//! Undefined characters classify as `999999`; Windows-31J user-defined rows
//! classify as `888888` without looking at their content.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::exceptions::KanjiLevels;
use crate::fidelity::FidelityReport;
use crate::record::{CharRecord, DoubleByteLayout, RecordKind};
use crate::Encoding;

/// Rows of the Windows-31J user-defined area
pub const USER_DEFINED_ROWS: std::ops::RangeInclusive<u8> = 95..=114;

/// Unicode segment (digit 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnicodeClass {
    /// Basic Multilingual Plane
    Bmp,
    /// Supplementary planes
    Supplementary,
    /// A combining diacritical mark
    CombiningMark,
    /// More than one code point
    Sequence,
    /// The governing encoding cannot produce the position's bytes
    DecodeOnly,
}

impl UnicodeClass {
    fn of(record: &CharRecord) -> Self {
        match record.code_point {
            None => UnicodeClass::Sequence,
            Some(c) if ('\u{0300}'..='\u{036F}').contains(&c) => UnicodeClass::CombiningMark,
            Some(c) if c as u32 >= 0x10000 => UnicodeClass::Supplementary,
            Some(_) => UnicodeClass::Bmp,
        }
    }

    fn digit(self) -> u8 {
        match self {
            UnicodeClass::Bmp => 1,
            UnicodeClass::Supplementary => 2,
            UnicodeClass::CombiningMark => 3,
            UnicodeClass::Sequence => 4,
            UnicodeClass::DecodeOnly => 7,
        }
    }
}

/// Which numbering of the normalization digit to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationScheme {
    /// 4 for NFC changes, 3 for half-width/full-width compatibility forms
    #[default]
    Revised,
    /// 3 for NFC changes, no separate half-width/full-width digit
    Legacy,
}

/// Normalization delta (digit 2); the first mismatch in NFC, NFKC, NFD
/// order wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationDelta {
    /// Equal to all three forms
    Unchanged,
    /// Changed only by NFD
    Decomposable,
    /// Changed by NFKC
    Compatibility,
    /// Changed by NFKC and in the half-width/full-width block
    WidthCompatibility,
    /// Changed by NFC
    Composed,
}

impl NormalizationDelta {
    fn of(record: &CharRecord, scheme: NormalizationScheme) -> Self {
        let s = &record.canonical;
        if *s != record.nfc {
            NormalizationDelta::Composed
        } else if *s != record.nfkc {
            let width_form = s
                .chars()
                .next()
                .is_some_and(|c| ('\u{FF00}'..='\u{FFEF}').contains(&c));
            if width_form && scheme == NormalizationScheme::Revised {
                NormalizationDelta::WidthCompatibility
            } else {
                NormalizationDelta::Compatibility
            }
        } else if *s != record.nfd {
            NormalizationDelta::Decomposable
        } else {
            NormalizationDelta::Unchanged
        }
    }

    fn digit(self, scheme: NormalizationScheme) -> u8 {
        match (self, scheme) {
            (NormalizationDelta::Unchanged, _) => 0,
            (NormalizationDelta::Decomposable, _) => 1,
            (NormalizationDelta::Compatibility, _) => 2,
            (NormalizationDelta::WidthCompatibility, _) => 3,
            (NormalizationDelta::Composed, NormalizationScheme::Revised) => 4,
            (NormalizationDelta::Composed, NormalizationScheme::Legacy) => 3,
        }
    }
}

/// Standard membership (digit 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standard {
    /// Control characters
    Control,
    /// US-ASCII
    Ascii,
    /// JIS X 0201
    JisX0201,
    /// JIS X 0208
    JisX0208,
    /// JIS X 0213
    JisX0213,
    /// JIS X 0212
    JisX0212,
    /// Vendor character outside the JIS standards
    Vendor,
    /// Not in any standard
    None,
}

impl Standard {
    fn digit(self) -> u8 {
        match self {
            Standard::Control => 0,
            Standard::Ascii => 1,
            Standard::JisX0201 => 2,
            Standard::JisX0208 => 3,
            Standard::JisX0213 => 4,
            Standard::JisX0212 => 5,
            Standard::Vendor => 7,
            Standard::None => 9,
        }
    }
}

/// Kanji level (digit 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Not a kanji
    NonKanji,
    /// Level 1 kanji
    Level1,
    /// Level 2 kanji
    Level2,
    /// Level 3 kanji (JIS X 0213 plane 1)
    Level3,
    /// Level 4 kanji (JIS X 0213 plane 2)
    Level4,
    /// JIS X 0212 supplementary kanji
    Supplementary,
    /// Outside every JIS kanji set
    Vendor,
}

impl Level {
    fn digit(self) -> u8 {
        match self {
            Level::NonKanji => 0,
            Level::Level1 => 1,
            Level::Level2 => 2,
            Level::Level3 => 3,
            Level::Level4 => 4,
            Level::Supplementary => 5,
            Level::Vendor => 7,
        }
    }

    /// From the Shift_JIS-2004 form when it decodes back, else from EUC-JP
    fn of(record: &CharRecord, report: &FidelityReport) -> Self {
        const BANDS: [(&[u8], Level); 6] = [
            (&[0x87, 0x9F], Level::NonKanji),
            (&[0x88, 0x9F], Level::Level3),
            (&[0x98, 0x73], Level::Level1),
            (&[0x98, 0x9F], Level::Level3),
            (&[0xEA, 0xA5], Level::Level2),
            (&[0xF0, 0x40], Level::Level3),
        ];
        if report.decodable(Encoding::SHIFT_JIS_2004) {
            let bytes = record.encoded(Encoding::SHIFT_JIS_2004).unwrap_or_default();
            BANDS
                .iter()
                .find(|(bound, _)| bytes < *bound)
                .map_or(Level::Level4, |&(_, level)| level)
        } else if report.decodable(Encoding::EUC_JP) {
            Level::Supplementary
        } else {
            Level::Vendor
        }
    }
}

/// Windows-31J region (digit 5)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowsRegion {
    /// Control characters
    Control,
    /// US-ASCII
    Ascii,
    /// Half-width katakana
    Katakana,
    /// JIS X 0208 area
    Base,
    /// NEC special characters (row 13)
    NecSpecial,
    /// NEC-selected IBM extensions (rows 89 to 92)
    NecSelectedIbm,
    /// IBM extensions (rows 115 to 119)
    IbmExtension,
    /// Encodes without substitution but does not decode back
    EncodeOnly,
    /// User-defined area
    UserDefined,
    /// Not encodable
    Unmappable,
}

impl WindowsRegion {
    fn digit(self) -> u8 {
        match self {
            WindowsRegion::Control => 0,
            WindowsRegion::Ascii => 1,
            WindowsRegion::Katakana => 2,
            WindowsRegion::Base => 3,
            WindowsRegion::NecSpecial => 4,
            WindowsRegion::NecSelectedIbm => 5,
            WindowsRegion::IbmExtension => 6,
            WindowsRegion::EncodeOnly => 7,
            WindowsRegion::UserDefined => 8,
            WindowsRegion::Unmappable => 9,
        }
    }

    /// From the Windows-31J form
    fn of(record: &CharRecord, report: &FidelityReport) -> Self {
        const BANDS: [(&[u8], WindowsRegion); 5] = [
            (&[0x87, 0x40], WindowsRegion::Base),
            (&[0x88, 0x9F], WindowsRegion::NecSpecial),
            (&[0xED, 0x40], WindowsRegion::Base),
            (&[0xF0, 0x40], WindowsRegion::NecSelectedIbm),
            (&[0xFA, 0x40], WindowsRegion::UserDefined),
        ];
        if report.decodable(Encoding::WINDOWS_31J) {
            let bytes = record.encoded(Encoding::WINDOWS_31J).unwrap_or_default();
            BANDS
                .iter()
                .find(|(bound, _)| bytes < *bound)
                .map_or(WindowsRegion::IbmExtension, |&(_, region)| region)
        } else if !record.has_substitution(Encoding::WINDOWS_31J) {
            WindowsRegion::EncodeOnly
        } else {
            WindowsRegion::Unmappable
        }
    }
}

/// Kanji usage level (digit 6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    /// Not a kanji
    NonKanji,
    /// Level digit from the kanji usage table
    Listed(char),
    /// A CJK ideograph absent from the table
    Unlisted,
}

impl Usage {
    fn of(record: &CharRecord, kanji: &KanjiLevels) -> Self {
        if let Some(level) = kanji.get(&record.canonical) {
            return Usage::Listed(level);
        }
        match record.code_point.map(|c| c as u32) {
            Some(0x3400..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F) => Usage::Unlisted,
            _ => Usage::NonKanji,
        }
    }

    fn digit(self) -> char {
        match self {
            Usage::NonKanji => '0',
            Usage::Listed(level) => level,
            Usage::Unlisted => '7',
        }
    }
}

/// Per-axis values of a classified character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Axes {
    /// Digit 1
    pub unicode: UnicodeClass,
    /// Digit 2
    pub normalization: NormalizationDelta,
    /// Digit 3
    pub standard: Standard,
    /// Digit 4
    pub level: Level,
    /// Digit 5
    pub windows: WindowsRegion,
    /// Digit 6
    pub usage: Usage,
    /// Numbering used for digit 2
    pub scheme: NormalizationScheme,
}

/// Classification code of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kubun {
    /// No character at the position (`999999`)
    Undefined,
    /// Windows-31J user-defined area (`888888`)
    UserDefined,
    /// A classified character
    Classified(Axes),
}

impl Kubun {
    /// The axes, unless short-circuited
    pub fn axes(&self) -> Option<&Axes> {
        match self {
            Kubun::Classified(axes) => Some(axes),
            _ => None,
        }
    }
}

impl fmt::Display for Kubun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kubun::Undefined => f.write_str("999999"),
            Kubun::UserDefined => f.write_str("888888"),
            Kubun::Classified(a) => write!(
                f,
                "{}{}{}{}{}{}",
                a.unicode.digit(),
                a.normalization.digit(a.scheme),
                a.standard.digit(),
                a.level.digit(),
                a.windows.digit(),
                a.usage.digit()
            ),
        }
    }
}

impl Serialize for Kubun {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How vendor characters that JIS X 0213 also encodes are labeled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VendorPolicy {
    /// Always as vendor characters
    #[default]
    Vendor,
    /// As JIS X 0213 (or JIS X 0212) when the level says so
    JisX0213,
}

/// Classifier settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierOptions {
    /// Labeling of vendor characters
    pub vendor_policy: VendorPolicy,
    /// Numbering of the normalization digit
    pub normalization_scheme: NormalizationScheme,
}

/// Derives [`Kubun`] codes from records and their fidelity reports
pub struct Classifier<'a> {
    kanji: &'a KanjiLevels,
    options: ClassifierOptions,
}

impl<'a> Classifier<'a> {
    /// Create a classifier over a kanji usage table
    pub fn new(kanji: &'a KanjiLevels, options: ClassifierOptions) -> Self {
        Self { kanji, options }
    }

    /// The settings in use
    pub fn options(&self) -> ClassifierOptions {
        self.options
    }

    /// Classify one record
    pub fn classify(&self, record: &CharRecord, report: &FidelityReport) -> Kubun {
        if let RecordKind::DoubleByte {
            kuten,
            layout: DoubleByteLayout::Windows31j,
            ..
        } = &record.kind
        {
            if USER_DEFINED_ROWS.contains(&kuten.row) {
                return Kubun::UserDefined;
            }
        }
        if record.is_undefined() {
            return Kubun::Undefined;
        }

        let scheme = self.options.normalization_scheme;
        let normalization = NormalizationDelta::of(record, scheme);
        let usage = Usage::of(record, self.kanji);
        let axes = |unicode, standard, level, windows| {
            Kubun::Classified(Axes {
                unicode,
                normalization,
                standard,
                level,
                windows,
                usage,
                scheme,
            })
        };
        let decode_only_unless = |encodable: bool, otherwise: UnicodeClass| {
            if encodable { otherwise } else { UnicodeClass::DecodeOnly }
        };

        match &record.kind {
            RecordKind::SingleByte { byte, .. } => {
                let (standard, windows) = match (record.canonical.as_str(), *byte) {
                    ("\u{A5}" | "\u{203E}", _) => (Standard::JisX0201, WindowsRegion::EncodeOnly),
                    (_, 0x00..=0x1F | 0x7F) => (Standard::Control, WindowsRegion::Control),
                    (_, 0x20..=0x7E) => (Standard::Ascii, WindowsRegion::Ascii),
                    _ => (Standard::JisX0201, WindowsRegion::Katakana),
                };
                Kubun::Classified(Axes {
                    unicode: UnicodeClass::Bmp,
                    normalization,
                    standard,
                    level: Level::NonKanji,
                    windows,
                    usage: Usage::NonKanji,
                    scheme,
                })
            }
            RecordKind::DoubleByte {
                kuten,
                layout: DoubleByteLayout::JisX0208,
                ..
            } => {
                let unicode =
                    decode_only_unless(report.encodable(Encoding::SHIFT_JIS), UnicodeClass::Bmp);
                let (level, windows) = match kuten.row {
                    ..=15 if record.has_substitution(Encoding::WINDOWS_31J) => {
                        (Level::NonKanji, WindowsRegion::Unmappable)
                    }
                    ..=15 => (Level::NonKanji, WindowsRegion::EncodeOnly),
                    ..=47 => (Level::Level1, WindowsRegion::Base),
                    _ => (Level::Level2, WindowsRegion::Base),
                };
                axes(unicode, Standard::JisX0208, level, windows)
            }
            RecordKind::DoubleByte { kuten, strict, .. } => {
                let unicode =
                    decode_only_unless(report.encodable(Encoding::WINDOWS_31J), UnicodeClass::Bmp);
                match kuten.row {
                    ..=12 => {
                        let level = Level::of(record, report);
                        let standard = if *strict == record.canonical {
                            Standard::JisX0208
                        } else {
                            self.vendor_standard(level)
                        };
                        axes(unicode, standard, level, WindowsRegion::Base)
                    }
                    ..=15 => {
                        let level = Level::of(record, report);
                        axes(unicode, self.vendor_standard(level), level, WindowsRegion::NecSpecial)
                    }
                    ..=47 => axes(unicode, Standard::JisX0208, Level::Level1, WindowsRegion::Base),
                    ..=88 => axes(unicode, Standard::JisX0208, Level::Level2, WindowsRegion::Base),
                    ..=94 => axes(
                        unicode,
                        Standard::Vendor,
                        Level::of(record, report),
                        WindowsRegion::NecSelectedIbm,
                    ),
                    _ => {
                        let level = Level::of(record, report);
                        let standard = match (self.options.vendor_policy, level) {
                            (VendorPolicy::Vendor, _) => Standard::Vendor,
                            (_, Level::Vendor) => Standard::Vendor,
                            (_, Level::Supplementary) => Standard::JisX0212,
                            _ => Standard::JisX0213,
                        };
                        axes(unicode, standard, level, WindowsRegion::IbmExtension)
                    }
                }
            }
            RecordKind::Jis0213 { plane, kuten, .. } => {
                let unicode = decode_only_unless(
                    report.encodable(Encoding::SHIFT_JIS_2004),
                    UnicodeClass::of(record),
                );
                let level = match (*plane, kuten.row) {
                    (2, _) => Level::Level4,
                    (_, ..=13) => Level::NonKanji,
                    _ => Level::Level3,
                };
                axes(unicode, Standard::JisX0213, level, WindowsRegion::of(record, report))
            }
            RecordKind::Jis0212 { .. } => {
                let unicode =
                    decode_only_unless(report.encodable(Encoding::EUC_JP), UnicodeClass::of(record));
                axes(
                    unicode,
                    Standard::JisX0212,
                    Level::of(record, report),
                    WindowsRegion::of(record, report),
                )
            }
            RecordKind::Combining { .. } => Kubun::Classified(Axes {
                unicode: UnicodeClass::CombiningMark,
                normalization: NormalizationDelta::Unchanged,
                standard: Standard::None,
                level: Level::NonKanji,
                windows: WindowsRegion::Unmappable,
                usage: Usage::NonKanji,
                scheme,
            }),
        }
    }

    /// Standard digit of a vendor character in rows 1 to 15
    fn vendor_standard(&self, level: Level) -> Standard {
        match self.options.vendor_policy {
            VendorPolicy::JisX0213 if level <= Level::Level4 => Standard::JisX0213,
            _ => Standard::Vendor,
        }
    }
}
