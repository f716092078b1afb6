//! Contract-only parsers for formats that need little more than a magic check and a handful of
//! fixed or cheaply-derived stream parameters: A52/AC3, ADX, AU, VOX, the ProTracker `.mod`
//! family, TTA, Shorten, and the console synthesis-chip formats.

pub mod a52;
pub mod adx;
pub mod asap;
pub mod au;
pub mod mod_tracker;
pub mod shorten;
pub mod synth_chip;
pub mod tta;
pub mod vox;

pub use a52::read_a52;
pub use adx::read_adx;
pub use asap::read_asap;
pub use au::read_au;
pub use mod_tracker::read_mod;
pub use shorten::read_shorten;
pub use synth_chip::{read_gbs, read_hes, read_kss, read_sgc, read_sid};
pub use tta::read_tta;
pub use vox::read_vox;
