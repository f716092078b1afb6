//! A pure Rust audio metadata extraction library.
//!
//! # Usage
//!
//! The following steps describe a basic usage of audiometa:
//!
//! 1.  Call [`read_metadata`] with the path to a media file. The extension is used to [`probe`]
//!     the file's [`Codec`][audiometa_core::record::Codec], then the matching format parser is
//!     run against it.
//! 2.  The returned [`MetadataRecord`][audiometa_core::record::MetadataRecord] carries every tag
//!     and stream parameter the parser could find; fields it could not populate are left at
//!     their zero value.
//!
//! Callers that already have an open handle (rather than a path) can use
//! [`read_metadata_from`] directly with any type implementing
//! [`ByteSource`][audiometa_core::io::ByteSource].
//!
//! [`ParseOptions`] carries the one runtime knob left over once a format's Cargo feature is
//! enabled: whether formats with no native ID3v1 convention of their own (TTA, Shorten) should
//! still scan for a trailing ID3v1 tag. `read_metadata_with_options` and
//! `read_metadata_from`'s `options` parameter accept it directly; `read_metadata` uses
//! `ParseOptions::default()` (scan on).
//!
//! # Supported formats
//!
//! | Format family                      | Feature flag | Default |
//! |-------------------------------------|--------------|---------|
//! | MPEG-1/2/2.5 Layer I/II/III          | `mpeg`       | Yes     |
//! | MP4/QuickTime (AAC, AAC-HE, ALAC)    | `mp4`        | Yes     |
//! | Ogg (Vorbis/Opus/Speex) and FLAC     | `xiph`       | Yes     |
//! | Monkey's Audio                       | `ape`        | Yes     |
//! | A52/ADX/AU/VOX/MOD/TTA/Shorten/chip  | `minor`      | Yes     |
//!
//! ID3v1 and ID3v2 tag reading (`id3v1`/`id3v2` features) are pulled in automatically by any
//! format that relies on them.

pub use audiometa_core::errors::{Error, ErrorKind, Result};
pub use audiometa_core::io::{BufferedSource, ByteSource, Whence};
pub use audiometa_core::options::ParseOptions;
pub use audiometa_core::record::{
    AlbumArt, AlbumArtType, Codec, CueSheet, CueSheetEncoding, Id3Version, MetadataRecord,
};

use std::fs::File;
use std::path::Path;

/// Lower-cases `path`'s final dot-extension and linearly matches it against every enabled
/// format's extension list. Returns `Codec::Unknown` if nothing matches.
pub fn probe_file_format(path: &Path) -> Codec {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return Codec::Unknown;
    };
    let ext = ext.to_ascii_lowercase();

    #[cfg(feature = "mpeg")]
    if matches!(ext.as_str(), "mp1" | "mp2" | "mp3") {
        return Codec::Mpeg;
    }
    #[cfg(feature = "mp4")]
    if matches!(ext.as_str(), "mp4" | "m4a" | "m4b" | "m4r" | "3gp") {
        return Codec::Mp4Aac;
    }
    #[cfg(feature = "xiph")]
    if matches!(ext.as_str(), "flac") {
        return Codec::Flac;
    }
    #[cfg(feature = "xiph")]
    if matches!(ext.as_str(), "ogg" | "oga") {
        return Codec::Vorbis;
    }
    #[cfg(feature = "xiph")]
    if ext == "opus" {
        return Codec::Opus;
    }
    #[cfg(feature = "xiph")]
    if ext == "spx" {
        return Codec::Speex;
    }
    #[cfg(feature = "ape")]
    if ext == "ape" {
        return Codec::Ape;
    }
    #[cfg(feature = "minor")]
    {
        match ext.as_str() {
            "ac3" | "a52" => return Codec::A52,
            "adx" => return Codec::Adx,
            "au" | "snd" => return Codec::Au,
            "vox" => return Codec::Vox,
            "mod" => return Codec::Mod,
            "tta" => return Codec::Tta,
            "shn" => return Codec::Shorten,
            "sid" => return Codec::Sid,
            "sgc" => return Codec::Sgc,
            "gbs" => return Codec::Gbs,
            "hes" => return Codec::Hes,
            "kss" => return Codec::Kss,
            "sap" | "cmc" | "cm3" | "cmr" | "cms" | "dmc" | "dlt" | "mpt" | "mpd" | "rmt"
            | "tm2" | "tmc" => return Codec::Asap,
            _ => {}
        }
    }

    Codec::Unknown
}

/// Opens `path`, probes its codec from the extension, and fully parses its metadata using the
/// default [`ParseOptions`].
pub fn read_metadata(path: &Path) -> Result<MetadataRecord> {
    read_metadata_with_options(path, &ParseOptions::default())
}

/// As [`read_metadata`], with explicit [`ParseOptions`].
pub fn read_metadata_with_options(path: &Path, options: &ParseOptions) -> Result<MetadataRecord> {
    let codec = probe_file_format(path);
    let file = File::open(path)?;
    let name = path.to_string_lossy().into_owned();
    let mut src = BufferedSource::new(file, name.clone());

    let mut record = MetadataRecord::new();
    record.path = name;
    read_metadata_from(&mut src, codec, &mut record, options)?;
    Ok(record)
}

/// Zero-inits `record`'s stream-dependent fields, dispatches to the parser for `codec`, then
/// seeks `src` back to offset 0.
pub fn read_metadata_from<S: ByteSource + ?Sized>(
    src: &mut S,
    codec: Codec,
    record: &mut MetadataRecord,
    options: &ParseOptions,
) -> Result<()> {
    match codec {
        #[cfg(feature = "mpeg")]
        Codec::Mpeg => audiometa_mpeg::read_mpeg(src, record)?,

        #[cfg(feature = "mp4")]
        Codec::Mp4Aac | Codec::Mp4AacHe | Codec::Mp4Alac => audiometa_mp4::read_mp4(src, record)?,

        #[cfg(feature = "xiph")]
        Codec::Flac => audiometa_xiph::read_flac(src, record)?,
        #[cfg(feature = "xiph")]
        Codec::Vorbis | Codec::Opus | Codec::Speex => audiometa_xiph::read_ogg(src, record)?,

        #[cfg(feature = "ape")]
        Codec::Ape => audiometa_ape::read_ape(src, record)?,

        #[cfg(feature = "minor")]
        Codec::A52 => audiometa_minor::read_a52(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Adx => audiometa_minor::read_adx(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Au => audiometa_minor::read_au(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Vox => audiometa_minor::read_vox(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Mod => audiometa_minor::read_mod(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Tta => audiometa_minor::read_tta(src, record, options)?,
        #[cfg(feature = "minor")]
        Codec::Shorten => audiometa_minor::read_shorten(src, record, options)?,
        #[cfg(feature = "minor")]
        Codec::Sid => audiometa_minor::read_sid(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Sgc => audiometa_minor::read_sgc(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Gbs => audiometa_minor::read_gbs(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Hes => audiometa_minor::read_hes(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Kss => audiometa_minor::read_kss(src, record)?,
        #[cfg(feature = "minor")]
        Codec::Asap => audiometa_minor::read_asap(src, record)?,

        Codec::Unknown => return audiometa_core::unknown_codec_error("no parser matched this file"),

        #[allow(unreachable_patterns)]
        _ => {
            return audiometa_core::unknown_codec_error(
                "parser for this codec was not compiled in (missing feature flag)",
            )
        }
    }

    src.seek(0, Whence::Start)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn probes_by_lowercased_extension() {
        assert_eq!(probe_file_format(&PathBuf::from("song.MP3")), Codec::Mpeg);
        assert_eq!(probe_file_format(&PathBuf::from("track.flac")), Codec::Flac);
        assert_eq!(probe_file_format(&PathBuf::from("tune.ape")), Codec::Ape);
        assert_eq!(probe_file_format(&PathBuf::from("chip.sid")), Codec::Sid);
    }

    #[test]
    fn unrecognised_extension_is_unknown() {
        assert_eq!(probe_file_format(&PathBuf::from("notes.txt")), Codec::Unknown);
    }
}
