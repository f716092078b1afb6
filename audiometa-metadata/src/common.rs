//! The key/value tag router shared by the Vorbis-comment and APEv2 readers (§4.11). Both formats
//! carry free-form `key=value` pairs; this module is the single place that knows how those keys
//! map onto [`MetadataRecord`] fields.

use audiometa_core::record::MetadataRecord;
use audiometa_core::replaygain::parse_replaygain_key;

const MAX_VALUE_LEN: usize = 240;

/// Which tag family the key/value pair came from, since a couple of keys (`year`/`date`,
/// `track`/`tracknumber`) are spelled differently per format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagFamily {
    Ape,
    Vorbis,
}

/// Applies one decoded `key`/`value` pair to `record`, honouring first-writer-wins throughout.
pub fn apply_tag(family: TagFamily, key: &str, value: &str, record: &mut MetadataRecord) {
    let key = key.trim();
    let value: String = value.chars().take(MAX_VALUE_LEN).collect();

    if key.eq_ignore_ascii_case("replaygain_track_gain")
        || key.eq_ignore_ascii_case("replaygain_album_gain")
        || key.eq_ignore_ascii_case("replaygain_track_peak")
        || key.eq_ignore_ascii_case("replaygain_album_peak")
        || key.eq_ignore_ascii_case("rg_radio")
        || key.eq_ignore_ascii_case("rg_audiophile")
        || key.eq_ignore_ascii_case("rg_peak")
    {
        parse_replaygain_key(key, &value, record);
        return;
    }

    if key.eq_ignore_ascii_case("title") {
        MetadataRecord::set_if_empty(&mut record.title, value);
    } else if key.eq_ignore_ascii_case("artist") {
        MetadataRecord::set_if_empty(&mut record.artist, value);
    } else if key.eq_ignore_ascii_case("album") {
        MetadataRecord::set_if_empty(&mut record.album, value);
    } else if key.eq_ignore_ascii_case("genre") {
        MetadataRecord::set_if_empty(&mut record.genre, value);
    } else if key.eq_ignore_ascii_case("composer") {
        MetadataRecord::set_if_empty(&mut record.composer, value);
    } else if key.eq_ignore_ascii_case("comment") {
        MetadataRecord::set_if_empty(&mut record.comment, value);
    } else if key.eq_ignore_ascii_case("albumartist")
        || key.eq_ignore_ascii_case("album artist")
        || key.eq_ignore_ascii_case("ensemble")
    {
        MetadataRecord::set_if_empty(&mut record.album_artist, value);
    } else if key.eq_ignore_ascii_case("grouping")
        || key.eq_ignore_ascii_case("content group")
        || key.eq_ignore_ascii_case("contentgroup")
    {
        MetadataRecord::set_if_empty(&mut record.grouping, value);
    } else if key.eq_ignore_ascii_case("musicbrainz_trackid")
        || key.eq_ignore_ascii_case("http://musicbrainz.org")
    {
        MetadataRecord::set_if_empty(&mut record.mb_track_id, value);
    } else if (family == TagFamily::Ape && key.eq_ignore_ascii_case("track"))
        || (family == TagFamily::Vorbis && key.eq_ignore_ascii_case("tracknumber"))
    {
        if record.track_string.is_empty() {
            record.track_string = value.clone();
        }
        if record.track_num == 0 {
            if let Some(n) = leading_integer(&value) {
                record.track_num = n;
            }
        }
    } else if key.eq_ignore_ascii_case("discnumber") || key.eq_ignore_ascii_case("disc") {
        if record.disc_string.is_empty() {
            record.disc_string = value.clone();
        }
        if record.disc_num == 0 {
            if let Some(n) = leading_integer(&value) {
                record.disc_num = n;
            }
        }
    } else if family == TagFamily::Ape && key.eq_ignore_ascii_case("year") {
        if record.year == 0 {
            if let Some(n) = leading_integer(&value) {
                record.year = n;
            }
        }
        MetadataRecord::set_if_empty(&mut record.year_string, value);
    } else if family == TagFamily::Vorbis && key.eq_ignore_ascii_case("date") {
        if record.year == 0 {
            if let Some(n) = value.get(0..4).and_then(|s| s.parse::<u32>().ok()) {
                if n >= 1900 {
                    record.year = n;
                }
            }
        }
        MetadataRecord::set_if_empty(&mut record.year_string, value);
    } else {
        log::debug!("common tag router: ignoring unrecognised key {key}");
    }
}

fn leading_integer(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}
