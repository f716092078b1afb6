//! Slice-based atom iteration for fully-buffered subtrees (`ilst` entries, `mp4a`/`alac` sample
//! entries, `----` freeform children) where the whole atom fits comfortably in memory.

use audiometa_core::endian::read_be32;

/// Splits `buf` into a flat list of `(fourcc, content)` pairs, one per top-level atom. A `size ==
/// 0` atom is taken to extend to the end of `buf`. Malformed trailing bytes (too short for a
/// header, or a declared size larger than what remains) stop the scan without failing it, since
/// the caller has already committed to reading the rest of the tree.
pub fn slice_atoms(mut buf: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    let mut out = Vec::new();
    loop {
        if buf.len() < 8 {
            break;
        }
        let raw_size = read_be32(&buf[0..4]) as usize;
        let fourcc = [buf[4], buf[5], buf[6], buf[7]];
        if raw_size == 1 {
            log::debug!("mp4: 64-bit atom sizes unsupported, stopping slice scan");
            break;
        }
        let size = if raw_size == 0 { buf.len() } else { raw_size };
        if size < 8 || size > buf.len() {
            break;
        }
        out.push((fourcc, buf[8..size].to_vec()));
        buf = &buf[size..];
    }
    out
}

/// As [`slice_atoms`], but each entry also carries the byte offset of its content (i.e. just past
/// the 8-byte atom header) within the original `buf`, for callers that need to resolve an
/// absolute file position for bytes inside a child atom.
pub fn slice_atoms_with_offsets(mut buf: &[u8]) -> Vec<([u8; 4], Vec<u8>, usize)> {
    let mut out = Vec::new();
    let mut base = 0usize;
    loop {
        if buf.len() < 8 {
            break;
        }
        let raw_size = read_be32(&buf[0..4]) as usize;
        let fourcc = [buf[4], buf[5], buf[6], buf[7]];
        if raw_size == 1 {
            log::debug!("mp4: 64-bit atom sizes unsupported, stopping slice scan");
            break;
        }
        let size = if raw_size == 0 { buf.len() } else { raw_size };
        if size < 8 || size > buf.len() {
            break;
        }
        out.push((fourcc, buf[8..size].to_vec(), base + 8));
        buf = &buf[size..];
        base += size;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((8 + content.len()) as u32).to_be_bytes());
        out.extend_from_slice(fourcc);
        out.extend_from_slice(content);
        out
    }

    #[test]
    fn splits_sibling_atoms() {
        let mut buf = atom(b"aaaa", b"one");
        buf.extend(atom(b"bbbb", b"two"));
        let atoms = slice_atoms(&buf);
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].0, *b"aaaa");
        assert_eq!(atoms[0].1, b"one");
        assert_eq!(atoms[1].0, *b"bbbb");
    }

    #[test]
    fn stops_on_truncated_trailing_atom() {
        let mut buf = atom(b"aaaa", b"one");
        buf.extend_from_slice(&[0, 0, 0, 100]); // claims 100 bytes, none follow
        buf.extend_from_slice(b"bbbb");
        let atoms = slice_atoms(&buf);
        assert_eq!(atoms.len(), 1);
    }
}
