//! Static RTP payload-type registry (RFC 3551 §6, tables 4 and 5).
//!
//! Maps the statically assigned payload-type numbers (0–34) to codec
//! metadata: clock rate, channel count, and the engine's codec identity.
//! Payload types ≥ 96 are dynamic and never appear here — their mapping
//! is negotiated per-session through `a=rtpmap`.
//!
//! Every lookup is total: unknown inputs yield documented defaults
//! (`90000`, `1`, `"unknown payload type"`, [`CodecId::Invalid`], `-1`)
//! rather than errors, so callers must check the sentinel explicitly.
//! The payload-type index is built once, lazily, and is immutable and
//! lock-free to read afterwards.

use std::sync::OnceLock;

use super::{CodecId, Track, TrackType};

#[derive(Debug, Clone, Copy)]
struct PayloadEntry {
    name: &'static str,
    track_type: TrackType,
    pt: u8,
    clock_rate: u32,
    channels: u32,
    codec: CodecId,
}

/// The static assignments of RFC 3551. Entries with [`CodecId::Invalid`]
/// are recognized on the wire but not decodable by this engine.
static PAYLOAD_TABLE: &[PayloadEntry] = &[
    entry("PCMU", TrackType::Audio, 0, 8000, 1, CodecId::G711U),
    entry("GSM", TrackType::Audio, 3, 8000, 1, CodecId::Invalid),
    entry("G723", TrackType::Audio, 4, 8000, 1, CodecId::Invalid),
    entry("DVI4_8000", TrackType::Audio, 5, 8000, 1, CodecId::Invalid),
    entry("DVI4_16000", TrackType::Audio, 6, 16000, 1, CodecId::Invalid),
    entry("LPC", TrackType::Audio, 7, 8000, 1, CodecId::Invalid),
    entry("PCMA", TrackType::Audio, 8, 8000, 1, CodecId::G711A),
    entry("G722", TrackType::Audio, 9, 8000, 1, CodecId::Invalid),
    entry("L16_Stereo", TrackType::Audio, 10, 44100, 2, CodecId::L16),
    entry("L16_Mono", TrackType::Audio, 11, 44100, 1, CodecId::L16),
    entry("QCELP", TrackType::Audio, 12, 8000, 1, CodecId::Invalid),
    entry("CN", TrackType::Audio, 13, 8000, 1, CodecId::Invalid),
    entry("MPA", TrackType::Audio, 14, 90000, 1, CodecId::Invalid),
    entry("G728", TrackType::Audio, 15, 8000, 1, CodecId::Invalid),
    entry("DVI4_11025", TrackType::Audio, 16, 11025, 1, CodecId::Invalid),
    entry("DVI4_22050", TrackType::Audio, 17, 22050, 1, CodecId::Invalid),
    entry("G729", TrackType::Audio, 18, 8000, 1, CodecId::Invalid),
    entry("CelB", TrackType::Video, 25, 90000, 1, CodecId::Invalid),
    entry("JPEG", TrackType::Video, 26, 90000, 1, CodecId::Invalid),
    entry("nv", TrackType::Video, 28, 90000, 1, CodecId::Invalid),
    entry("H261", TrackType::Video, 31, 90000, 1, CodecId::Invalid),
    entry("MPV", TrackType::Video, 32, 90000, 1, CodecId::Invalid),
    entry("MP2T", TrackType::Video, 33, 90000, 1, CodecId::Ts),
    entry("H263", TrackType::Video, 34, 90000, 1, CodecId::Invalid),
];

const fn entry(
    name: &'static str,
    track_type: TrackType,
    pt: u8,
    clock_rate: u32,
    channels: u32,
    codec: CodecId,
) -> PayloadEntry {
    PayloadEntry {
        name,
        track_type,
        pt,
        clock_rate,
        channels,
        codec,
    }
}

/// O(1) lookup by payload-type number, index built on first use.
fn by_pt(pt: u8) -> Option<&'static PayloadEntry> {
    static INDEX: OnceLock<[Option<u8>; 128]> = OnceLock::new();
    let index = INDEX.get_or_init(|| {
        let mut index = [None; 128];
        for (slot, entry) in PAYLOAD_TABLE.iter().enumerate() {
            index[entry.pt as usize] = Some(slot as u8);
        }
        index
    });
    index
        .get(pt as usize)
        .copied()
        .flatten()
        .map(|slot| &PAYLOAD_TABLE[slot as usize])
}

fn by_codec(codec: CodecId) -> Option<&'static PayloadEntry> {
    if codec == CodecId::Invalid {
        return None;
    }
    PAYLOAD_TABLE.iter().find(|entry| entry.codec == codec)
}

/// Clock rate for a payload type, `90000` when unmapped.
pub fn clock_rate(pt: u8) -> u32 {
    by_pt(pt).map_or(90000, |entry| entry.clock_rate)
}

/// Clock rate for a codec identity, `90000` (with a diagnostic) when the
/// codec has no static payload type.
pub fn clock_rate_by_codec(codec: CodecId) -> u32 {
    match by_codec(codec) {
        Some(entry) => entry.clock_rate,
        None => {
            tracing::warn!(?codec, "unsupported codec, assuming 90000 Hz");
            90000
        }
    }
}

/// Static payload type for a track, or `-1` when the track must negotiate
/// a dynamic type (≥ 96).
///
/// For audio tracks the static assignment only applies when the track's
/// sample rate and channel count match the registered entry.
pub fn payload_type(track: &dyn Track) -> i32 {
    let Some(entry) = by_codec(track.codec_id()) else {
        return -1;
    };
    if let Some(audio) = track.as_audio() {
        if audio.sample_rate() != entry.clock_rate || audio.channels() != entry.channels {
            return -1;
        }
    }
    entry.pt as i32
}

/// Track type carried by a payload type, [`TrackType::Invalid`] when
/// unmapped.
pub fn track_type(pt: u8) -> TrackType {
    by_pt(pt).map_or(TrackType::Invalid, |entry| entry.track_type)
}

/// Audio channel count for a payload type, `1` when unmapped.
pub fn audio_channels(pt: u8) -> u32 {
    by_pt(pt).map_or(1, |entry| entry.channels)
}

/// Registered name for a payload type.
pub fn name(pt: u8) -> &'static str {
    by_pt(pt).map_or("unknown payload type", |entry| entry.name)
}

/// Codec identity for a payload type, [`CodecId::Invalid`] when unmapped.
pub fn codec_id(pt: u8) -> CodecId {
    by_pt(pt).map_or(CodecId::Invalid, |entry| entry.codec)
}
