//! Decodes the handful of text encodings tag formats in this workspace actually use into UTF-8.
//!
//! Codepage *tables* (the binary data backing SJIS/GB2312/KSX1001/BIG5/ISO-8859-*) are not
//! shipped by this crate; callers provide a [`CodepageLookup`] that resolves a table name to its
//! flat big-endian-u16 contents.

/// Resolves a codepage table name (e.g. `"932.cp"`) to its flat array of big-endian Unicode code
/// points. Returns `None` if the table is unavailable, in which case lookups fall back to U+FFFD.
pub type CodepageLookup = fn(&str) -> Option<&'static [u16]>;

/// Source encodings a tag frame may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Iso8859_1,
    Utf8,
    Utf16Le,
    Utf16Be,
    Sjis,
    Gb2312,
    Ksx1001,
    Big5,
}

/// Decodes `bytes` from `encoding` into a UTF-8 `String`. `cp` is consulted only for the CJK
/// variants; pass a resolver that always returns `None` if CJK decoding isn't needed.
pub fn decode(bytes: &[u8], encoding: Encoding, cp: CodepageLookup) -> String {
    match encoding {
        Encoding::Iso8859_1 => decode_iso8859_1(bytes),
        Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Encoding::Utf16Le => decode_utf16(bytes, false),
        Encoding::Utf16Be => decode_utf16(bytes, true),
        Encoding::Sjis => decode_cjk(bytes, "932.cp", cp, true),
        Encoding::Gb2312 => decode_cjk(bytes, "936.cp", cp, false),
        Encoding::Ksx1001 => decode_cjk(bytes, "949.cp", cp, false),
        Encoding::Big5 => decode_cjk(bytes, "950.cp", cp, false),
    }
}

/// ISO-8859-1 is a direct codepoint-per-byte mapping onto the first 256 Unicode codepoints.
pub fn decode_iso8859_1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Decodes a UTF-16 byte stream (optionally preceded by a BOM, which is consumed and not
/// emitted) combining surrogate pairs with the standard formula.
pub fn decode_utf16(bytes: &[u8], big_endian: bool) -> String {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len() / 2);
    let mut chunks = bytes.chunks_exact(2);
    for pair in &mut chunks {
        let unit = if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        };
        units.push(unit);
    }

    let mut start = 0;
    if units.first() == Some(&0xFEFF) {
        start = 1;
    }

    let mut out = String::with_capacity(units.len());
    let mut i = start;
    while i < units.len() {
        let unit = units[i];
        if (0xD800..=0xDBFF).contains(&unit) && i + 1 < units.len() {
            let low = units[i + 1];
            if (0xDC00..=0xDFFF).contains(&low) {
                let high10 = (unit - 0xD800) as u32;
                let low10 = (low - 0xDC00) as u32;
                let cp = 0x10000 + (high10 << 10) + low10;
                if let Some(c) = char::from_u32(cp) {
                    out.push(c);
                } else {
                    out.push('\u{FFFD}');
                }
                i += 2;
                continue;
            }
        }
        out.push(char::from_u32(unit as u32).unwrap_or('\u{FFFD}'));
        i += 1;
    }
    out
}

/// Encodes `s` as raw UTF-16LE bytes, for use by tests exercising the round-trip law.
pub fn encode_utf16_le(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len() * 2);
    for unit in s.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

/// Two-byte big-endian CJK lookup, minus `0x8000`, into a caller-supplied table. SJIS also
/// treats `0xA1..=0xDF` as single-byte half-width katakana (mapped directly onto
/// `0xFF61..=0xFF9F`).
fn decode_cjk(bytes: &[u8], table_name: &str, cp: CodepageLookup, is_sjis: bool) -> String {
    let table = cp(table_name);
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        if is_sjis && (0xA1..=0xDF).contains(&b0) {
            let cp_val = 0xFF61 + (b0 as u32 - 0xA1);
            out.push(char::from_u32(cp_val).unwrap_or('\u{FFFD}'));
            i += 1;
            continue;
        }
        if i + 1 < bytes.len() {
            let word = u16::from_be_bytes([b0, bytes[i + 1]]);
            let idx = word.wrapping_sub(0x8000) as usize;
            let resolved = table
                .and_then(|t| t.get(idx))
                .and_then(|&cp| char::from_u32(cp as u32));
            out.push(resolved.unwrap_or('\u{FFFD}'));
            i += 2;
        } else {
            out.push('\u{FFFD}');
            i += 1;
        }
    }
    out
}

/// Normalises an ID3v2 text frame body to UTF-8 given its leading encoding byte (`enc` in
/// `0..=3`), per the ID3 text-encoding munge rule.
pub fn decode_id3_text(enc: u8, body: &[u8]) -> String {
    match enc {
        0 => decode_iso8859_1(body),
        1 => decode_utf16_with_bom_heuristic(body),
        2 => decode_utf16(body, true),
        3 => String::from_utf8_lossy(body).into_owned(),
        _ => decode_iso8859_1(body),
    }
}

fn decode_utf16_with_bom_heuristic(body: &[u8]) -> String {
    if body.len() >= 2 {
        match [body[0], body[1]] {
            [0xFF, 0xFE] => return decode_utf16(body, false),
            [0xFE, 0xFF] => return decode_utf16(body, true),
            _ => {}
        }
    }
    // No BOM: infer little-endian if the second byte of the first code unit is zero, matching
    // the heuristic most ID3 writers without a BOM rely on (ASCII-range text under UTF-16LE).
    let big_endian = !(body.len() >= 2 && body[1] == 0);
    decode_utf16(body, big_endian)
}

/// Splits an ID3 multi-string frame body (e.g. `TXXX`) into its NUL-terminated substrings and
/// decodes + re-joins them with a single NUL separator.
pub fn decode_id3_multi_string(enc: u8, body: &[u8]) -> String {
    let sep_width: usize = if enc == 1 || enc == 2 { 2 } else { 1 };
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + sep_width <= body.len() {
        let is_sep = body[i..i + sep_width].iter().all(|&b| b == 0);
        if is_sep {
            parts.push(decode_id3_text(enc, &body[start..i]));
            i += sep_width;
            start = i;
        } else {
            i += sep_width;
        }
    }
    if start < body.len() {
        parts.push(decode_id3_text(enc, &body[start..]));
    }
    parts.join("\u{0}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_le_roundtrip() {
        let s = "Hello \u{1F600}"; // includes a surrogate-pair emoji
        let bytes = encode_utf16_le(s);
        let decoded = decode_utf16(&bytes, false);
        assert_eq!(decoded, s);
    }

    #[test]
    fn iso8859_1_is_identity_for_ascii() {
        assert_eq!(decode_iso8859_1(b"Artist"), "Artist");
    }

    #[test]
    fn unknown_cjk_table_yields_replacement_char() {
        fn no_tables(_: &str) -> Option<&'static [u16]> {
            None
        }
        let decoded = decode_cjk(&[0x82, 0xA0], "932.cp", no_tables, false);
        assert_eq!(decoded, "\u{FFFD}");
    }

    #[test]
    fn id3_multi_string_concatenates_with_single_nul() {
        let mut body = b"ALBUM ARTIST".to_vec();
        body.push(0);
        body.extend_from_slice(b"Value");
        let decoded = decode_id3_multi_string(3, &body);
        assert_eq!(decoded, "ALBUM ARTIST\u{0}Value");
    }
}
