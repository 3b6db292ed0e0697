use std::borrow::Cow;
use std::str::FromStr;

use encoding_rs::{Encoding, GB18030, SHIFT_JIS, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

/// Text encoding used for save descriptions on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nls {
    /// Western releases; one byte per character.
    #[default]
    Latin1,
    UTF8,
    ShiftJIS,
    /// Treated as GB18030 (superset).
    GBK,
}

impl Nls {
    #[inline]
    fn as_encoding_rs(self) -> &'static Encoding {
        match self {
            Nls::Latin1 => WINDOWS_1252,
            Nls::UTF8 => UTF_8,
            Nls::ShiftJIS => SHIFT_JIS,
            Nls::GBK => GB18030,
        }
    }

    /// Encode a string. Unrepresentable characters are replaced.
    pub fn encode<'a>(self, s: &'a str) -> Cow<'a, [u8]> {
        let (cow, _, _) = self.as_encoding_rs().encode(s);
        cow
    }

    /// Encode into at most `max_len` bytes, dropping whole characters from
    /// the end so a multi-byte sequence is never split.
    pub fn encode_truncated(self, s: &str, max_len: usize) -> Vec<u8> {
        let encoded = self.encode(s);
        if encoded.len() <= max_len {
            return encoded.into_owned();
        }

        let mut end = s.len();
        for (idx, _) in s.char_indices().rev() {
            end = idx;
            let candidate = self.encode(&s[..end]);
            if candidate.len() <= max_len {
                return candidate.into_owned();
            }
        }
        debug_assert_eq!(end, 0);
        Vec::new()
    }

    /// Decode a C-style string: stop at the first NUL.
    pub fn decode_cstr(self, bytes: &[u8]) -> String {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let (cow, _, _) = self.as_encoding_rs().decode(&bytes[..end]);
        cow.into_owned()
    }
}

impl FromStr for Nls {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "latin1" | "cp1252" | "windows-1252" => Ok(Nls::Latin1),
            "utf8" | "utf-8" => Ok(Nls::UTF8),
            "shiftjis" | "sjis" => Ok(Nls::ShiftJIS),
            "gbk" | "gb2312" | "gb18030" => Ok(Nls::GBK),
            _ => Err(format!("unknown text encoding: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stops_at_nul() {
        let mut field = [0u8; 16];
        field[..5].copy_from_slice(b"Hello");
        field[6] = b'X';
        assert_eq!(Nls::Latin1.decode_cstr(&field), "Hello");
    }

    #[test]
    fn test_latin1_roundtrip_accents() {
        let bytes = Nls::Latin1.encode("Café Montfaucon");
        assert_eq!(bytes.len(), "Café Montfaucon".chars().count());
        assert_eq!(Nls::Latin1.decode_cstr(&bytes), "Café Montfaucon");
    }

    #[test]
    fn test_truncate_keeps_whole_characters() {
        // "é" is two bytes in UTF-8; a 4-byte budget must not split it
        let bytes = Nls::UTF8.encode_truncated("abcé", 4);
        assert_eq!(bytes, b"abc");

        let bytes = Nls::UTF8.encode_truncated("abcé", 5);
        assert_eq!(Nls::UTF8.decode_cstr(&bytes), "abcé");

        let bytes = Nls::ShiftJIS.encode_truncated("パリ", 3);
        assert_eq!(bytes.len(), 2);
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("sjis".parse::<Nls>(), Ok(Nls::ShiftJIS));
        assert_eq!("UTF-8".parse::<Nls>(), Ok(Nls::UTF8));
        assert_eq!("cp1252".parse::<Nls>(), Ok(Nls::Latin1));
        assert!("ebcdic".parse::<Nls>().is_err());
    }
}
