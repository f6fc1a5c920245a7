//! ISO-2022-JP with the JIS X 0212 designation of ISO-2022-JP-2

use crate::codec::{jis_x0212, Codec, Mapped, ShiftJis, REPLACEMENT};
use crate::kuten::{DESIGNATE_ASCII, DESIGNATE_JIS_X0208, DESIGNATE_JIS_X0212, ESC};
use crate::Encoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Ascii,
    Roman,
    Katakana,
    JisX0208,
    JisX0212,
}

impl Mode {
    fn designation(self) -> &'static [u8] {
        match self {
            Mode::Ascii => &DESIGNATE_ASCII,
            Mode::Roman => b"\x1B(J",
            Mode::Katakana => b"\x1B(I",
            Mode::JisX0208 => &DESIGNATE_JIS_X0208,
            Mode::JisX0212 => &DESIGNATE_JIS_X0212,
        }
    }

    fn is_double(self) -> bool {
        matches!(self, Mode::JisX0208 | Mode::JisX0212)
    }
}

/// Stateful ISO-2022-JP codec. The encoder always returns to ASCII at the end
/// of its output and writes substitutions in ASCII mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso2022Jp;

impl Iso2022Jp {
    fn map(c: char) -> (Mode, [u8; 2], usize) {
        let substitution = (
            Mode::Ascii,
            [Encoding::ISO_2022_JP.substitution(), 0],
            1,
        );
        match ShiftJis.map_char(c) {
            Some(Mapped::Single(b)) if c == '\u{A5}' || c == '\u{203E}' => (Mode::Roman, [b, 0], 1),
            Some(Mapped::Single(b)) if b < 0x80 => (Mode::Ascii, [b, 0], 1),
            Some(Mapped::Single(b)) if (0xA1..=0xDF).contains(&b) => {
                (Mode::Katakana, [b - 0x80, 0], 1)
            }
            Some(Mapped::Single(_)) => substitution,
            Some(Mapped::Double(k)) => (Mode::JisX0208, [k.row + 0x20, k.col + 0x20], 2),
            None => match jis_x0212().encode(c) {
                Some([b1, b2]) => (Mode::JisX0212, [b1 - 0x80, b2 - 0x80], 2),
                None => substitution,
            },
        }
    }

    fn designation_at(bytes: &[u8]) -> Option<(Mode, usize)> {
        let modes = [
            Mode::Ascii,
            Mode::Roman,
            Mode::Katakana,
            Mode::JisX0208,
            Mode::JisX0212,
        ];
        modes
            .into_iter()
            .map(|m| (m, m.designation()))
            .chain([(Mode::JisX0208, &b"\x1B$@"[..])])
            .find(|(_, d)| bytes.starts_with(d))
            .map(|(m, d)| (m, d.len()))
    }
}

impl Codec for Iso2022Jp {
    fn encoding(&self) -> Encoding {
        Encoding::ISO_2022_JP
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len() * 2);
        let mut mode = Mode::Ascii;
        for c in text.chars() {
            let (target, bytes, len) = Self::map(c);
            if target != mode {
                out.extend_from_slice(target.designation());
                mode = target;
            }
            out.extend_from_slice(&bytes[..len]);
        }
        if mode != Mode::Ascii {
            out.extend_from_slice(Mode::Ascii.designation());
        }
        out
    }

    fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        let mut mode = Mode::Ascii;
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if b == ESC {
                match Self::designation_at(&bytes[i..]) {
                    Some((m, len)) => {
                        mode = m;
                        i += len;
                    }
                    None => {
                        out.push(REPLACEMENT);
                        i += 1;
                    }
                }
                continue;
            }
            if b == b'\n' || b == b'\r' {
                out.push(b as char);
                i += 1;
                continue;
            }
            if mode.is_double() {
                let pair = match bytes.get(i + 1) {
                    Some(&b2) if (0x21..=0x7E).contains(&b) && (0x21..=0x7E).contains(&b2) => {
                        [b, b2]
                    }
                    _ => {
                        out.push(REPLACEMENT);
                        i += 1;
                        continue;
                    }
                };
                let decoded = if mode == Mode::JisX0208 {
                    ShiftJis.decode_kuten(pair[0] - 0x20, pair[1] - 0x20)
                } else {
                    jis_x0212().decode([pair[0] | 0x80, pair[1] | 0x80])
                };
                out.push(decoded.unwrap_or(REPLACEMENT));
                i += 2;
                continue;
            }
            let c = match (mode, b) {
                (_, 0x80..=0xFF) => REPLACEMENT,
                (Mode::Roman, 0x5C) => '\u{A5}',
                (Mode::Roman, 0x7E) => '\u{203E}',
                (Mode::Katakana, 0x21..=0x5F) => {
                    char::from_u32(0xFF61 + (b - 0x21) as u32).unwrap_or(REPLACEMENT)
                }
                (Mode::Katakana, _) => REPLACEMENT,
                _ => b as char,
            };
            out.push(c);
            i += 1;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_designates_and_returns_to_ascii() {
        let codec = Iso2022Jp;
        assert_eq!(
            codec.encode("a亜b"),
            vec![b'a', 0x1B, 0x24, 0x42, 0x30, 0x21, 0x1B, 0x28, 0x42, b'b']
        );
        assert_eq!(codec.encode("abc"), b"abc".to_vec());
    }

    #[test]
    fn test_substitution_is_written_in_ascii_mode() {
        let codec = Iso2022Jp;
        assert_eq!(
            codec.encode("亜①"),
            vec![0x1B, 0x24, 0x42, 0x30, 0x21, 0x1B, 0x28, 0x42, 0x3F]
        );
    }

    #[test]
    fn test_jis_x0212_and_roman() {
        let codec = Iso2022Jp;
        let encoded = codec.encode("丂");
        assert_eq!(
            encoded,
            vec![0x1B, 0x24, 0x28, 0x44, 0x30, 0x21, 0x1B, 0x28, 0x42]
        );
        assert_eq!(codec.decode(&encoded), "丂");
        let yen = codec.encode("\u{A5}");
        assert_eq!(yen, vec![0x1B, 0x28, 0x4A, 0x5C, 0x1B, 0x28, 0x42]);
        assert_eq!(codec.decode(&yen), "\u{A5}");
    }

    #[test]
    fn test_decode() {
        let codec = Iso2022Jp;
        assert_eq!(codec.decode(b"\x1B$B0!\x1B(B"), "亜");
        assert_eq!(codec.decode(b"\x1B$@0!"), "亜");
        assert_eq!(codec.decode(b"\x1B(I1"), "ｱ");
        assert_eq!(codec.decode(b"\x1B$B0"), "\u{FFFD}");
        assert_eq!(codec.decode(b"\x1B$B!A\x1B(B"), "\u{301C}");
        assert_eq!(codec.decode(&[0xB1]), "\u{FFFD}");
    }
}
