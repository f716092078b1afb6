//! ReplayGain dB-string parsing and gain-factor conversion, built on [`crate::fixedpoint`].

use crate::fixedpoint::{factor, fpatof};
use crate::record::MetadataRecord;

pub const FP_BITS: u32 = 12;
pub const FP_ONE: i64 = 1 << FP_BITS;
pub const FP_MIN: i64 = -48 * FP_ONE;
pub const FP_MAX: i64 = 17 * FP_ONE;

/// Converts a `Q12` gain value to the `Q7.24` factor stored on [`MetadataRecord`], clamping to
/// the `[-48, +17] dB` range first.
pub fn convert_gain(gain_q12: i64) -> i64 {
    let clamped = gain_q12.clamp(FP_MIN, FP_MAX);
    factor(clamped, FP_BITS) << (24 - FP_BITS)
}

/// Parses a gain string such as `"-3.45 dB"` into `Q12`.
pub fn parse_gain_string(s: &str) -> i64 {
    fpatof(s, FP_BITS)
}

/// Parses a peak string such as `"0.987"` into `Q7.24`.
pub fn parse_peak_string(s: &str) -> i64 {
    fpatof(s, 24)
}

/// Sets track/album level+gain from a already-decoded gain value (e.g. an ID3 `RVA2` frame),
/// honouring first-writer-wins.
pub fn set_gain_from_units(record: &mut MetadataRecord, album: bool, gain_x512: i64, peak_q24: i64) {
    let gain_q12 = gain_x512 * FP_ONE / 512;
    if album {
        if record.album_level == 0 {
            record.album_level = gain_q12;
            record.album_gain = convert_gain(gain_q12);
            record.album_peak = peak_q24;
        }
    } else if record.track_level == 0 {
        record.track_level = gain_q12;
        record.track_gain = convert_gain(gain_q12);
        record.track_peak = peak_q24;
    }
}

/// Recognises a ReplayGain key from a Vorbis comment / APEv2 item / ID3 `TXXX` description and
/// applies its value, respecting first-writer-wins on every field independently.
pub fn parse_replaygain_key(key: &str, value: &str, record: &mut MetadataRecord) {
    let key = key.trim();
    if record.track_level == 0
        && (key.eq_ignore_ascii_case("replaygain_track_gain") || key.eq_ignore_ascii_case("rg_radio"))
    {
        record.track_level = parse_gain_string(value);
        record.track_gain = convert_gain(record.track_level);
    } else if record.album_level == 0
        && (key.eq_ignore_ascii_case("replaygain_album_gain") || key.eq_ignore_ascii_case("rg_audiophile"))
    {
        record.album_level = parse_gain_string(value);
        record.album_gain = convert_gain(record.album_level);
    } else if record.track_peak == 0
        && (key.eq_ignore_ascii_case("replaygain_track_peak") || key.eq_ignore_ascii_case("rg_peak"))
    {
        record.track_peak = parse_peak_string(value);
    } else if record.album_peak == 0 && key.eq_ignore_ascii_case("replaygain_album_peak") {
        record.album_peak = parse_peak_string(value);
    }
}
