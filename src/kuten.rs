//! Ku-ten (row-column) coordinate arithmetic
//!
//! Maps JIS X 0208 and JIS X 0213 coordinates to the code words used by
//! ISO-2022-JP, EUC-JP and Shift_JIS, and maps Shift_JIS-2004 byte pairs back
//! to coordinates. Everything here is plain integer arithmetic.

use std::fmt;

use serde::Serialize;

use crate::{Error, Result};

/// Escape byte that introduces ISO-2022 designations
pub const ESC: u8 = 0x1B;

/// Prefix OR-ed into an EUC-JP word for plane 2 (single shift 3)
pub const EUC_PLANE2: u32 = 0x8F0000;

/// Designation of JIS X 0208 in ISO-2022-JP
pub const DESIGNATE_JIS_X0208: [u8; 3] = [ESC, b'$', b'B'];
/// Designation of JIS X 0212 in ISO-2022-JP-2
pub const DESIGNATE_JIS_X0212: [u8; 4] = [ESC, b'$', b'(', b'D'];
/// Designation of US-ASCII in ISO-2022-JP
pub const DESIGNATE_ASCII: [u8; 3] = [ESC, b'(', b'B'];

/// A row-column coordinate of a 94x94 table (rows extend to 120 for the
/// Windows-31J vendor blocks)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Kuten {
    /// Row (ku)
    pub row: u8,
    /// Column (ten)
    pub col: u8,
}

impl Kuten {
    /// Create a coordinate without range checks
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Kuten {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row < 100 {
            write!(f, "{:02}-{:02}", self.row, self.col)
        } else {
            write!(f, "{:3}-{:02}", self.row, self.col)
        }
    }
}

/// A plane-row-column coordinate of a JIS X 0213 or JIS X 0212 table;
/// JIS X 0212 lives on plane 2
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MenKuten {
    /// Plane (men), 1 or 2
    pub plane: u8,
    /// Row (ku)
    pub row: u8,
    /// Column (ten)
    pub col: u8,
}

impl MenKuten {
    /// Create a coordinate without range checks
    pub const fn new(plane: u8, row: u8, col: u8) -> Self {
        Self { plane, row, col }
    }

    /// The row and column without the plane
    pub fn kuten(self) -> Kuten {
        Kuten::new(self.row, self.col)
    }
}

impl fmt::Display for MenKuten {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.plane, self.row, self.col)
    }
}

/// Combine two bytes into a big-endian word
#[inline]
pub fn word(hi: u32, lo: u32) -> u32 {
    hi << 8 | lo
}

/// Split a word into its `len` low-order bytes, most significant first
pub fn to_bytes(word: u32, len: usize) -> Vec<u8> {
    (0..len)
        .rev()
        .map(|i| (word >> (8 * i) & 0xFF) as u8)
        .collect()
}

fn check_range(name: &'static str, value: u8, min: u8, max: u8) -> Result<()> {
    if value < min || max < value {
        return Err(Error::OutOfRange {
            name,
            value: value as u32,
            min: min as u32,
            max: max as u32,
        });
    }
    Ok(())
}

/// Rows of JIS X 0213 plane 2 occupied by the JIS X 0212 supplementary
/// kanji layout and therefore absent from Shift_JIS-2004
pub fn is_reserved_plane2_row(row: u8) -> bool {
    row == 2 || (6..=7).contains(&row) || (9..=11).contains(&row) || (16..=77).contains(&row)
}

/// ISO-2022-JP (JIS) word of a coordinate
pub fn kuten_to_jis(row: u8, col: u8) -> Result<u32> {
    check_range("row", row, 1, 94)?;
    check_range("col", col, 1, 94)?;
    Ok(word(row as u32 + 0x20, col as u32 + 0x20))
}

/// EUC-JP word of a plane 1 coordinate
pub fn kuten_to_euc(row: u8, col: u8) -> Result<u32> {
    check_range("row", row, 1, 94)?;
    check_range("col", col, 1, 94)?;
    Ok(word(row as u32 + 0xA0, col as u32 + 0xA0))
}

/// EUC-JP word of a plane-aware coordinate; plane 2 words carry the `0x8F`
/// single-shift prefix
pub fn kuten_to_euc_plane(plane: u8, row: u8, col: u8) -> Result<u32> {
    check_range("plane", plane, 1, 2)?;
    let euc = kuten_to_euc(row, col)?;
    if plane == 1 {
        Ok(euc)
    } else {
        Ok(EUC_PLANE2 | euc)
    }
}

/// Shift_JIS word of a coordinate. Rows 95 to 120 address the Windows-31J
/// user-defined and IBM extension blocks.
pub fn kuten_to_shift_jis(row: u8, col: u8) -> Result<u32> {
    check_range("row", row, 1, 120)?;
    check_range("col", col, 1, 94)?;
    let (k, t) = (row as u32, col as u32);
    let c1 = (k - 1) / 2 + if k <= 62 { 0x81 } else { 0xC1 };
    Ok(word(c1, trail_byte(k, t)))
}

/// Shift_JIS-2004 word of a plane-aware coordinate.
///
/// Plane 2 rows that belong to the supplementary kanji layout fail with
/// [`Error::InvalidRegion`]; sweeps over whole blocks skip them.
pub fn kuten_to_shift_jis_plane(plane: u8, row: u8, col: u8) -> Result<u32> {
    check_range("plane", plane, 1, 2)?;
    check_range("row", row, 1, 94)?;
    if plane == 1 {
        return kuten_to_shift_jis(row, col);
    }
    check_range("col", col, 1, 94)?;
    if is_reserved_plane2_row(row) {
        return Err(Error::InvalidRegion { plane, row });
    }
    let (k, t) = (row as u32, col as u32);
    let c1 = if k <= 15 {
        (k + 0x1DF) / 2 - (k / 8) * 3
    } else {
        (k + 0x19B) / 2
    };
    Ok(word(c1, trail_byte(k, t)))
}

#[inline]
fn trail_byte(k: u32, t: u32) -> u32 {
    if k % 2 == 1 {
        t + if t <= 63 { 0x3F } else { 0x40 }
    } else {
        t + 0x9E
    }
}

/// Inverse of [`kuten_to_shift_jis_plane`]
pub fn shift_jis_2004_to_kuten(bytes: [u8; 2]) -> Result<MenKuten> {
    let [c1, c2] = bytes;
    if !matches!(c1, 0x81..=0x9F | 0xE0..=0xFC) {
        return Err(Error::OutOfRange {
            name: "lead",
            value: c1 as u32,
            min: 0x81,
            max: 0xFC,
        });
    }
    if c2 == 0x7F {
        return Err(Error::OutOfRange {
            name: "trail",
            value: c2 as u32,
            min: 0x80,
            max: 0xFC,
        });
    }
    check_range("trail", c2, 0x40, 0xFC)?;

    let (c1, c2) = (c1 as u32, c2 as u32);
    let w = word(c1, c2);
    let plane = if c1 < 0xF0 { 1 } else { 2 };
    let base = match c1 {
        _ if c1 < 0xE0 => 0x80,
        _ if c1 < 0xF0 => 0xC0,
        _ if w < 0xF09F => 0xEF,
        _ if w < 0xF140 => 0xEC,
        _ if w < 0xF29F => 0xEF,
        _ if w < 0xF49F => 0xEC,
        _ => 0xCD,
    };
    let row = (c1 - base) * 2 - u32::from(c2 < 0x9F);
    let col = c2
        - match c2 {
            _ if c2 < 0x80 => 0x3F,
            _ if c2 < 0x9F => 0x40,
            _ => 0x9E,
        };
    Ok(MenKuten::new(plane, row as u8, col as u8))
}

/// EUC-JP word for a Shift_JIS-2004 byte pair
pub fn shift_jis_2004_to_euc(bytes: [u8; 2]) -> Result<u32> {
    let mk = shift_jis_2004_to_kuten(bytes)?;
    kuten_to_euc_plane(mk.plane, mk.row, mk.col)
}

/// ISO-2022-JP byte sequence of a coordinate: the JIS word designated as
/// JIS X 0208 (plane 1) or JIS X 0212 (plane 2), followed by a return to ASCII
pub fn kuten_to_iso2022(plane: u8, row: u8, col: u8) -> Result<Vec<u8>> {
    check_range("plane", plane, 1, 2)?;
    let jis = kuten_to_jis(row, col)?;
    let mut out = Vec::with_capacity(9);
    if plane == 1 {
        out.extend_from_slice(&DESIGNATE_JIS_X0208);
    } else {
        out.extend_from_slice(&DESIGNATE_JIS_X0212);
    }
    out.extend(to_bytes(jis, 2));
    out.extend_from_slice(&DESIGNATE_ASCII);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jis_and_euc_words() {
        assert_eq!(kuten_to_jis(1, 1).unwrap(), 0x2121);
        assert_eq!(kuten_to_jis(16, 1).unwrap(), 0x3021);
        assert_eq!(kuten_to_jis(94, 94).unwrap(), 0x7E7E);
        assert_eq!(kuten_to_euc(16, 1).unwrap(), 0xB0A1);
        assert_eq!(kuten_to_euc_plane(1, 16, 1).unwrap(), 0xB0A1);
        assert_eq!(kuten_to_euc_plane(2, 16, 1).unwrap(), 0x8FB0A1);
    }

    #[test]
    fn test_shift_jis_words() {
        assert_eq!(kuten_to_shift_jis(1, 1).unwrap(), 0x8140);
        assert_eq!(kuten_to_shift_jis(1, 63).unwrap(), 0x817E);
        assert_eq!(kuten_to_shift_jis(1, 64).unwrap(), 0x8180);
        assert_eq!(kuten_to_shift_jis(2, 1).unwrap(), 0x819F);
        assert_eq!(kuten_to_shift_jis(2, 44).unwrap(), 0x81CA);
        assert_eq!(kuten_to_shift_jis(16, 1).unwrap(), 0x889F);
        assert_eq!(kuten_to_shift_jis(62, 94).unwrap(), 0x9FFC);
        assert_eq!(kuten_to_shift_jis(63, 1).unwrap(), 0xE040);
        assert_eq!(kuten_to_shift_jis(89, 1).unwrap(), 0xED40);
        assert_eq!(kuten_to_shift_jis(95, 1).unwrap(), 0xF040);
        assert_eq!(kuten_to_shift_jis(115, 1).unwrap(), 0xFA40);
        assert_eq!(kuten_to_shift_jis(120, 94).unwrap(), 0xFCFC);
    }

    #[test]
    fn test_plane2_words() {
        assert_eq!(kuten_to_shift_jis_plane(2, 1, 1).unwrap(), 0xF040);
        assert_eq!(kuten_to_shift_jis_plane(2, 8, 1).unwrap(), 0xF09F);
        assert_eq!(kuten_to_shift_jis_plane(2, 3, 1).unwrap(), 0xF140);
        assert_eq!(kuten_to_shift_jis_plane(2, 12, 1).unwrap(), 0xF29F);
        assert_eq!(kuten_to_shift_jis_plane(2, 15, 94).unwrap(), 0xF49E);
        assert_eq!(kuten_to_shift_jis_plane(2, 78, 1).unwrap(), 0xF49F);
        assert_eq!(kuten_to_shift_jis_plane(2, 94, 94).unwrap(), 0xFCFC);
        assert_eq!(
            kuten_to_shift_jis_plane(1, 16, 1).unwrap(),
            kuten_to_shift_jis(16, 1).unwrap()
        );
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            kuten_to_jis(0, 1),
            Err(Error::OutOfRange {
                name: "row",
                value: 0,
                min: 1,
                max: 94
            })
        );
        assert!(kuten_to_jis(95, 1).is_err());
        assert!(kuten_to_euc(1, 95).is_err());
        assert!(kuten_to_shift_jis(121, 1).is_err());
        assert!(kuten_to_shift_jis(1, 0).is_err());
        assert!(kuten_to_euc_plane(3, 1, 1).is_err());
        assert!(matches!(
            kuten_to_shift_jis_plane(1, 95, 1),
            Err(Error::OutOfRange { name: "row", .. })
        ));
    }

    #[test]
    fn test_reserved_plane2_rows() {
        for row in [2, 6, 7, 9, 10, 11, 16, 50, 77] {
            assert_eq!(
                kuten_to_shift_jis_plane(2, row, 1),
                Err(Error::InvalidRegion { plane: 2, row })
            );
        }
        for row in [1, 3, 4, 5, 8, 12, 13, 14, 15, 78, 94] {
            assert!(kuten_to_shift_jis_plane(2, row, 1).is_ok());
        }
    }

    #[test]
    fn test_shift_jis_2004_round_trip() {
        for plane in 1..=2u8 {
            for row in 1..=94u8 {
                for col in 1..=94u8 {
                    let sjis = match kuten_to_shift_jis_plane(plane, row, col) {
                        Ok(sjis) => sjis,
                        Err(Error::InvalidRegion { .. }) => continue,
                        Err(e) => panic!("unexpected error: {e}"),
                    };
                    let bytes = [(sjis >> 8) as u8, sjis as u8];
                    assert_eq!(
                        shift_jis_2004_to_kuten(bytes).unwrap(),
                        MenKuten::new(plane, row, col),
                        "sjis {sjis:04X}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_inverse_rejects_non_lead_bytes() {
        assert!(shift_jis_2004_to_kuten([0x41, 0x40]).is_err());
        assert!(shift_jis_2004_to_kuten([0xA1, 0x40]).is_err());
        assert!(shift_jis_2004_to_kuten([0x81, 0x7F]).is_err());
        assert!(shift_jis_2004_to_kuten([0x81, 0x3F]).is_err());
    }

    #[test]
    fn test_shift_jis_2004_to_euc() {
        assert_eq!(shift_jis_2004_to_euc([0x88, 0x9F]).unwrap(), 0xB0A1);
        assert_eq!(shift_jis_2004_to_euc([0xF0, 0x40]).unwrap(), 0x8FA1A1);
    }

    #[test]
    fn test_iso2022_sequences() {
        assert_eq!(
            kuten_to_iso2022(1, 16, 1).unwrap(),
            vec![0x1B, 0x24, 0x42, 0x30, 0x21, 0x1B, 0x28, 0x42]
        );
        assert_eq!(
            kuten_to_iso2022(2, 16, 1).unwrap(),
            vec![0x1B, 0x24, 0x28, 0x44, 0x30, 0x21, 0x1B, 0x28, 0x42]
        );
    }

    #[test]
    fn test_to_bytes_and_display() {
        assert_eq!(to_bytes(0x8FB0A1, 3), vec![0x8F, 0xB0, 0xA1]);
        assert_eq!(to_bytes(0x81CA, 2), vec![0x81, 0xCA]);
        assert_eq!(Kuten::new(2, 44).to_string(), "02-44");
        assert_eq!(Kuten::new(115, 1).to_string(), "115-01");
        assert_eq!(MenKuten::new(2, 94, 1).to_string(), "2-94-01");
    }
}
