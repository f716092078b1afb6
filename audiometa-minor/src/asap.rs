//! The ASAP family of 8-bit computer music formats (SAP, CMC, CM3, CMR, CMS, DMC, DLT, MPT, MPD,
//! RMT, TM2, TMC): fixed synthesis parameters and a genre tag of `"Game"`, since none of these
//! containers carry per-file stream parameters of their own.

use audiometa_core::io::ByteSource;
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::Result;

const ASAP_BITRATE: u32 = 706;
const ASAP_FREQUENCY: u32 = 44100;

/// Fills in the fixed ASAP-family synthesis parameters and genre; there is no header to read.
pub fn read_asap<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Asap;
    record.filesize = src.size()?;
    record.vbr = false;
    record.bitrate = ASAP_BITRATE;
    record.frequency = ASAP_FREQUENCY;
    record.channels = 1;
    record.genre = "Game".to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    #[test]
    fn fills_fixed_synthesis_parameters() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; 100]), "t.sap");
        let mut record = MetadataRecord::new();
        read_asap(&mut src, &mut record).unwrap();
        assert_eq!(record.bitrate, ASAP_BITRATE);
        assert_eq!(record.frequency, ASAP_FREQUENCY);
        assert_eq!(record.genre, "Game");
        assert!(!record.vbr);
    }
}
