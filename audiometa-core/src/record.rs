//! The uniform output record every format parser in this workspace fills in, and the small
//! value types hung off it.

/// Every container/codec combination this workspace can identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Unknown,
    Mpeg,
    Mp4Aac,
    Mp4AacHe,
    Mp4Alac,
    Flac,
    Vorbis,
    Opus,
    Speex,
    Ape,
    A52,
    Adx,
    Au,
    Vox,
    Sid,
    Sgc,
    Gbs,
    Hes,
    Kss,
    Mod,
    Tta,
    Shorten,
    Asap,
}

impl Default for Codec {
    fn default() -> Self {
        Codec::Unknown
    }
}

/// The ID3 tag version a record's tag fields were (at least partly) sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Id3Version {
    V1_0,
    V1_1,
    V2_2,
    V2_3,
    V2_4,
}

/// Image format of embedded album art.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlbumArtType {
    #[default]
    Unknown,
    Unsync,
    Bmp,
    Png,
    Jpg,
}

#[derive(Debug, Clone, Default)]
pub struct AlbumArt {
    pub art_type: AlbumArtType,
    pub pos: u64,
    pub size: u64,
}

/// Text encoding of an embedded cuesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CueSheetEncoding {
    #[default]
    Iso8859_1,
    Utf8,
    Utf16Le,
    Utf16Be,
}

#[derive(Debug, Clone, Default)]
pub struct CueSheet {
    pub pos: u64,
    pub size: u64,
    pub encoding: CueSheetEncoding,
}

/// The single output of this library: a zero-initialised record that a dispatcher fills the
/// `codec` field of, which a format parser then mutates field-by-field, honouring
/// first-writer-wins for every tag and ReplayGain field.
#[derive(Debug, Clone, Default)]
pub struct MetadataRecord {
    pub path: String,
    pub codec: Codec,

    // Text tags.
    pub title: String,
    pub artist: String,
    pub album: String,
    pub album_artist: String,
    pub composer: String,
    pub comment: String,
    pub genre: String,
    pub grouping: String,
    pub disc_string: String,
    pub track_string: String,
    pub year_string: String,
    pub mb_track_id: String,

    // Numeric tags.
    pub disc_num: u32,
    pub track_num: u32,
    pub year: u32,

    // Stream parameters.
    pub bitrate: u32,
    pub frequency: u32,
    pub filesize: u64,
    pub length: u64,
    pub channels: u32,
    pub layer: u8,
    pub samples: u64,
    pub frame_count: u32,
    pub bytes_per_frame: u32,
    pub vbr: bool,
    pub has_toc: bool,
    pub toc: Option<[u8; 100]>,
    pub first_frame_offset: u64,
    pub id3v1_len: u32,
    pub id3v2_len: u32,
    pub lead_trim: u64,
    pub tail_trim: u64,
    pub needs_upsampling_correction: bool,

    // ReplayGain, Q19.12 levels / Q7.24 gains+peaks.
    pub track_level: i64,
    pub album_level: i64,
    pub track_gain: i64,
    pub album_gain: i64,
    pub track_peak: i64,
    pub album_peak: i64,

    // Embedded art / cuesheet.
    pub has_album_art: bool,
    pub album_art: AlbumArt,
    pub has_embedded_cue_sheet: bool,
    pub cue_sheet: CueSheet,

    pub id3_version: Option<Id3Version>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `field` to `value` unless it is already non-empty (first-writer-wins).
    pub fn set_if_empty(field: &mut String, value: String) {
        if field.is_empty() {
            *field = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_if_empty_is_first_writer_wins() {
        let mut field = String::new();
        MetadataRecord::set_if_empty(&mut field, "Bach".to_string());
        MetadataRecord::set_if_empty(&mut field, "Mozart".to_string());
        assert_eq!(field, "Bach");
    }
}
