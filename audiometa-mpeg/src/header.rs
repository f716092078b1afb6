//! MPEG-1/2/2.5 layer I/II/III frame header decoding: version/layer/bitrate/frequency,
//! frame-size and frame-time computation.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    L1,
    L2,
    L3,
}

// [version_index: 0=V1,1=V2/V2.5][layer_index: 0=L1,1=L2,2=L3][bitrate_index: 0..=15]
const BITRATES: [[[u32; 16]; 3]; 2] = [
    [
        [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
        [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
    ],
    [
        [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
        [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
    ],
];

// [version: V1, V2, V2.5][sample_rate_index: 0..=2]
const SAMPLE_RATES: [[u32; 3]; 3] = [[44100, 48000, 32000], [22050, 24000, 16000], [11025, 12000, 8000]];

#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: Layer,
    pub bitrate: u32,
    pub frequency: u32,
    pub padding: u32,
    pub channel_mode: u8,
    pub channels: u32,
}

/// Returns the subset of header bits the synchronisation algorithm uses to decide whether two
/// candidate headers are "the same type": sync, version, layer, sample-rate index.
pub fn sync_subset(header: u32) -> u32 {
    header & 0xFFFE_0C00
}

/// Validates and decodes a 4-byte big-endian MPEG frame header. Returns `None` if the header
/// fails any of the validity checks (sync word, reserved version/layer, bitrate/sample-rate
/// index out of range).
pub fn decode(header: u32) -> Option<FrameHeader> {
    if header & 0xFFE0_0000 != 0xFFE0_0000 {
        return None; // 11-bit sync word 0x7FF must be set.
    }

    let version = match (header >> 19) & 0b11 {
        0b00 => MpegVersion::V2_5,
        0b01 => return None, // reserved
        0b10 => MpegVersion::V2,
        0b11 => MpegVersion::V1,
        _ => unreachable!(),
    };

    let layer = match (header >> 17) & 0b11 {
        0b00 => return None, // reserved
        0b01 => Layer::L3,
        0b10 => Layer::L2,
        0b11 => Layer::L1,
        _ => unreachable!(),
    };

    let bitrate_index = ((header >> 12) & 0xF) as usize;
    if bitrate_index == 0 || bitrate_index == 15 {
        return None; // free-format / reserved, out of the spec's accepted [1,14] range.
    }

    let sample_rate_index = ((header >> 10) & 0x3) as usize;
    if sample_rate_index > 2 {
        return None; // reserved
    }

    let version_idx = if version == MpegVersion::V1 { 0 } else { 1 };
    let layer_idx = match layer {
        Layer::L1 => 0,
        Layer::L2 => 1,
        Layer::L3 => 2,
    };

    let version_freq_idx = match version {
        MpegVersion::V1 => 0,
        MpegVersion::V2 => 1,
        MpegVersion::V2_5 => 2,
    };

    let bitrate = BITRATES[version_idx][layer_idx][bitrate_index];
    let frequency = SAMPLE_RATES[version_freq_idx][sample_rate_index];
    let padding = (header >> 9) & 1;
    let channel_mode = ((header >> 6) & 0b11) as u8;
    let channels = if channel_mode == 3 { 1 } else { 2 };

    Some(FrameHeader { version, layer, bitrate, frequency, padding, channel_mode, channels })
}

/// Frame size in bytes, per §4.7.
pub fn frame_size(h: &FrameHeader) -> u32 {
    if h.frequency == 0 {
        return 0;
    }
    match h.layer {
        Layer::L1 => (12000 * h.bitrate / h.frequency + h.padding) * 4,
        Layer::L2 | Layer::L3 => (1000 * frame_samples(h) / 8) * h.bitrate / h.frequency + h.padding,
    }
}

/// Samples encoded per frame, per §4.7: Layer I is always 384; Layer II is 1152 at MPEG1 and 576
/// at MPEG2/2.5; Layer III is 1152 at MPEG1 and 576 at MPEG2/2.5.
pub fn frame_samples(h: &FrameHeader) -> u32 {
    match h.layer {
        Layer::L1 => 384,
        Layer::L2 => if h.version == MpegVersion::V1 { 1152 } else { 576 },
        Layer::L3 => if h.version == MpegVersion::V1 { 1152 } else { 576 },
    }
}

/// The Xing/Info/VBRI probe offset (bytes past the 4-byte frame header) for this header's
/// version/layer/channel-mode combination.
pub fn vbr_header_offset(h: &FrameHeader) -> usize {
    let mono = h.channel_mode == 3;
    match (h.version, mono) {
        (MpegVersion::V1, false) => 32,
        (MpegVersion::V1, true) => 17,
        (_, false) => 17,
        (_, true) => 9,
    }
}
