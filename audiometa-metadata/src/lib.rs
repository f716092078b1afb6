//! Tag readers: ID3v1, ID3v2.2/2.3/2.4, APEv2, and Vorbis-comment, plus the common key/value
//! tag router the latter two share.

pub mod common;
pub mod genre;

#[cfg(feature = "id3v1")]
pub mod id3v1;

#[cfg(feature = "id3v2")]
pub mod id3v2;

#[cfg(feature = "ape")]
pub mod ape_tags;

#[cfg(feature = "vorbis")]
pub mod vorbis;
