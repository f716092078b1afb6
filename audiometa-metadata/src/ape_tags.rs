//! An APEv2 tag reader: footer/header locate, item iteration, routed through the common tag
//! router.

use audiometa_core::endian::read_le32;
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::MetadataRecord;
use audiometa_core::Result;

use crate::common::{apply_tag, TagFamily};

const FOOTER_SIZE: u64 = 32;
const HAS_HEADER: u32 = 0x8000_0000;
const ITEM_VALUE_TYPE_MASK: u32 = 0x0000_0006;

/// Attempts to read a trailing APEv2 tag from `src`. Returns `true` if a tag was found.
pub fn read_apev2<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<bool> {
    let size = src.size()?;
    if size < FOOTER_SIZE {
        return Ok(false);
    }

    let mut footer = [0u8; FOOTER_SIZE as usize];
    let n = src.scoped_read_at(-(FOOTER_SIZE as i64), Whence::End, &mut footer)?;
    if n as u64 != FOOTER_SIZE || &footer[0..8] != b"APETAGEX" {
        return Ok(false);
    }

    let version = read_le32(&footer[8..12]);
    if version != 1000 && version != 2000 {
        log::debug!("apev2: unsupported tag version {version}");
        return Ok(false);
    }

    let tag_size = read_le32(&footer[12..16]) as u64; // size of items, excludes header (if any)
    let item_count = read_le32(&footer[16..20]);
    let flags = read_le32(&footer[20..24]);

    // `tag_size` always covers the footer + items, but excludes the mirrored header even when
    // present; the header (if any) precedes `items_start` and is otherwise unused here.
    let items_start = size - FOOTER_SIZE - (tag_size - FOOTER_SIZE);
    let _ = flags & HAS_HEADER; // only affects where the header itself lives, not items_start

    let mut buf = vec![0u8; tag_size.saturating_sub(FOOTER_SIZE) as usize];
    if !buf.is_empty() {
        src.scoped_read_at(items_start as i64, Whence::Start, &mut buf)?;
    }

    let mut cursor = 0usize;
    for _ in 0..item_count {
        let Some(consumed) = read_item(&buf[cursor..], record) else {
            break;
        };
        cursor += consumed;
        if cursor > buf.len() {
            break;
        }
    }

    Ok(true)
}

/// Parses one `{length, flags, key\0, value}` item, returning the number of bytes consumed.
fn read_item(buf: &[u8], record: &mut MetadataRecord) -> Option<usize> {
    if buf.len() < 8 {
        return None;
    }
    let length = read_le32(&buf[0..4]) as usize;
    let flags = read_le32(&buf[4..8]);
    let rest = &buf[8..];

    let key_end = rest.iter().position(|&b| b == 0)?;
    let key = String::from_utf8_lossy(&rest[..key_end]).into_owned();
    let value_start = key_end + 1;
    if rest.len() < value_start + length {
        return None;
    }
    let value_bytes = &rest[value_start..value_start + length];

    match flags & ITEM_VALUE_TYPE_MASK {
        0 => {
            let value = String::from_utf8_lossy(value_bytes);
            apply_tag(TagFamily::Ape, &key, &value, record);
        }
        2 => {
            log::debug!("apev2: skipping external-reference item {key}");
        }
        _ => {
            log::debug!("apev2: skipping binary item {key}");
        }
    }

    Some(8 + value_start + length)
}
