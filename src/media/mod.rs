//! Media track model: track kinds, codec identities, the static payload
//! registry, and the RTP wire format.
//!
//! The traits here are the seams to the rest of a streaming engine:
//!
//! - [`Track`] / [`AudioTrack`]: what SDP generation needs to know about a
//!   negotiated media track (kind, codec, bit rate, audio clocking).
//! - [`CodecProbe`]: hook for deriving an audio sample rate from a parsed
//!   SDP track's format parameters when the description itself omits it
//!   (some encoders only ship the rate inside `a=fmtp` config bytes).

pub mod payload;
pub mod rtp;

use crate::protocol::sdp::SdpTrack;

/// Kind of media a track carries.
///
/// `Title` is the session-level block that precedes the first `m=` line
/// in an SDP body; `Invalid` covers media keywords this engine does not
/// handle (e.g. `application`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackType {
    Title,
    Audio,
    Video,
    Invalid,
}

impl TrackType {
    /// Map an SDP media keyword (the `<kind>` of an `m=` line) to a track
    /// type. The empty string is the session-level Title block.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "" => TrackType::Title,
            "video" => TrackType::Video,
            "audio" => TrackType::Audio,
            _ => TrackType::Invalid,
        }
    }

    /// SDP media keyword for this track type (empty for non-media types).
    pub fn keyword(self) -> &'static str {
        match self {
            TrackType::Audio => "audio",
            TrackType::Video => "video",
            TrackType::Title | TrackType::Invalid => "",
        }
    }
}

/// Codec identity as this engine knows it.
///
/// Registry entries for legacy payload types whose codec the engine does
/// not decode carry [`CodecId::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    H264,
    H265,
    Aac,
    G711A,
    G711U,
    L16,
    Opus,
    Ts,
    Invalid,
}

/// A negotiated media track, as seen by SDP generation.
///
/// Implemented by the engine's track objects; consumed as `&dyn Track` by
/// [`crate::protocol::describe::media_description`] and
/// [`payload::payload_type`].
pub trait Track: Send + Sync {
    fn track_type(&self) -> TrackType;

    fn codec_id(&self) -> CodecId;

    /// Codec name as it appears in `a=rtpmap` (e.g. `"H264"`).
    fn codec_name(&self) -> &str;

    /// Bit rate in bits per second; 0 when unknown.
    fn bit_rate(&self) -> u32 {
        0
    }

    /// Audio view of this track, when it is an audio track.
    fn as_audio(&self) -> Option<&dyn AudioTrack> {
        None
    }
}

/// Audio-specific track properties.
pub trait AudioTrack: Track {
    /// Audio clock rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Channel count (1 = mono, 2 = stereo).
    fn channels(&self) -> u32;
}

/// Codec-detection fallback for SDP parsing.
///
/// When an audio track's sample rate is still unset after the post-parse
/// pass, the parser hands the track descriptor to this probe; a returned
/// rate is adopted.
pub trait CodecProbe: Send + Sync {
    /// Derive an audio sample rate from the track's format parameters,
    /// or `None` when the codec/config is not recognized.
    fn sample_rate_from_sdp(&self, track: &SdpTrack) -> Option<u32>;
}
