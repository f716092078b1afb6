//! Headerless Dialogic VOX: 8 kHz, mono, 4-bit ADPCM, CBR, the whole file is sample data.

use audiometa_core::io::ByteSource;
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::Result;

/// Fills in VOX's fixed stream parameters; there is no header to read.
pub fn read_vox<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Vox;
    let filesize = src.size()?;
    record.filesize = filesize;

    record.frequency = 8000;
    record.bitrate = 8000 * 4 / 1000;
    record.vbr = false;
    record.length = filesize >> 2;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    #[test]
    fn length_is_filesize_over_four() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; 4000]), "t.vox");
        let mut record = MetadataRecord::new();
        read_vox(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 8000);
        assert_eq!(record.bitrate, 32);
        assert_eq!(record.length, 1000);
    }
}
