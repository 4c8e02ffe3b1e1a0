//! SDP generation (RFC 4566 / RFC 8866).
//!
//! Produces the SDP body returned by DESCRIBE responses, assembled from
//! two independent builders:
//!
//! - [`session_description`] — the session-level block (`v=`/`o=`/`s=`/
//!   `c=`/`t=`, the playback range, and the aggregate `a=control:*`).
//! - [`media_description`] — one `m=` block per negotiated track.
//!
//! Both are pure functions over explicit inputs; callers concatenate the
//! session block with one media block per track.

use std::collections::BTreeMap;

use crate::media::Track;

/// Identity advertised in the default session block.
const SERVER_NAME: &str = "rtsp-media";

/// Build the session-level SDP block.
///
/// `duration_secs ≤ 0` marks a live stream (`a=range:npt=now-`), anything
/// positive an on-demand one (`a=range:npt=0-<duration>`).
///
/// When `header_overrides` is non-empty its entries are emitted verbatim
/// as `key=value` lines — the caller fully controls the origin/session/
/// connection/time lines. Otherwise a canonical default block is used.
pub fn session_description(
    duration_secs: f32,
    header_overrides: &BTreeMap<String, String>,
    version: u32,
) -> String {
    let mut sdp: Vec<String> = Vec::new();

    sdp.push(format!("v={version}"));
    if header_overrides.is_empty() {
        sdp.push("o=- 0 0 IN IP4 0.0.0.0".to_string());
        sdp.push(format!("s=Streamed by {SERVER_NAME}"));
        sdp.push("c=IN IP4 0.0.0.0".to_string());
        sdp.push("t=0 0".to_string());
    } else {
        for (key, value) in header_overrides {
            sdp.push(format!("{key}={value}"));
        }
    }

    if duration_secs <= 0.0 {
        // live
        sdp.push("a=range:npt=now-".to_string());
    } else {
        // on-demand
        sdp.push(format!("a=range:npt=0-{duration_secs}"));
    }
    sdp.push("a=control:*".to_string());

    format!("{}\r\n", sdp.join("\r\n"))
}

/// Build one `m=` block for a track negotiated onto `payload_type`.
///
/// Statically assigned payload types (< 96) need no `a=rtpmap` — the
/// registry already defines their mapping. Dynamic types emit
/// `a=rtpmap:<pt> <codec>/<rate>` with a `/<channels>` suffix for audio.
pub fn media_description(payload_type: u8, track: &dyn Track) -> String {
    let mut sdp: Vec<String> = Vec::new();

    sdp.push(format!(
        "m={} 0 RTP/AVP {}",
        track.track_type().keyword(),
        payload_type
    ));

    let kbps = track.bit_rate() >> 10;
    if kbps > 0 {
        sdp.push(format!("b=AS:{kbps}"));
    }

    if payload_type >= 96 {
        let sample_rate = match track.as_audio() {
            Some(audio) => audio.sample_rate(),
            None => 90000,
        };
        let mut rtpmap = format!(
            "a=rtpmap:{} {}/{}",
            payload_type,
            track.codec_name(),
            sample_rate
        );
        if let Some(audio) = track.as_audio() {
            rtpmap.push_str(&format!("/{}", audio.channels()));
        }
        sdp.push(rtpmap);
    }

    tracing::debug!(payload_type, "media description: {}", sdp.join(" | "));

    format!("{}\r\n", sdp.join("\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{AudioTrack, CodecId, TrackType};

    struct VideoTrack {
        bit_rate: u32,
    }

    impl Track for VideoTrack {
        fn track_type(&self) -> TrackType {
            TrackType::Video
        }
        fn codec_id(&self) -> CodecId {
            CodecId::H264
        }
        fn codec_name(&self) -> &str {
            "H264"
        }
        fn bit_rate(&self) -> u32 {
            self.bit_rate
        }
    }

    struct PcmuTrack;

    impl Track for PcmuTrack {
        fn track_type(&self) -> TrackType {
            TrackType::Audio
        }
        fn codec_id(&self) -> CodecId {
            CodecId::G711U
        }
        fn codec_name(&self) -> &str {
            "PCMU"
        }
        fn as_audio(&self) -> Option<&dyn AudioTrack> {
            Some(self)
        }
    }

    impl AudioTrack for PcmuTrack {
        fn sample_rate(&self) -> u32 {
            8000
        }
        fn channels(&self) -> u32 {
            1
        }
    }

    struct AacTrack;

    impl Track for AacTrack {
        fn track_type(&self) -> TrackType {
            TrackType::Audio
        }
        fn codec_id(&self) -> CodecId {
            CodecId::Aac
        }
        fn codec_name(&self) -> &str {
            "MPEG4-GENERIC"
        }
        fn as_audio(&self) -> Option<&dyn AudioTrack> {
            Some(self)
        }
    }

    impl AudioTrack for AacTrack {
        fn sample_rate(&self) -> u32 {
            44100
        }
        fn channels(&self) -> u32 {
            2
        }
    }

    #[test]
    fn live_session_block() {
        let sdp = session_description(0.0, &BTreeMap::new(), 0);
        assert!(sdp.starts_with("v=0\r\n"));
        assert!(sdp.contains("o=- 0 0 IN IP4 0.0.0.0\r\n"));
        assert!(sdp.contains("s=Streamed by rtsp-media\r\n"));
        assert!(sdp.contains("t=0 0\r\n"));
        assert!(sdp.contains("a=range:npt=now-\r\n"));
        assert!(sdp.ends_with("a=control:*\r\n"));
    }

    #[test]
    fn on_demand_session_block() {
        let sdp = session_description(12.5, &BTreeMap::new(), 0);
        assert!(sdp.contains("a=range:npt=0-12.5\r\n"));
        assert!(!sdp.contains("npt=now-"));
    }

    #[test]
    fn header_overrides_are_verbatim() {
        let mut overrides = BTreeMap::new();
        overrides.insert("o".to_string(), "user 1 1 IN IP4 10.0.0.1".to_string());
        overrides.insert("s".to_string(), "Custom".to_string());
        let sdp = session_description(0.0, &overrides, 0);
        assert!(sdp.contains("o=user 1 1 IN IP4 10.0.0.1\r\n"));
        assert!(sdp.contains("s=Custom\r\n"));
        assert!(
            !sdp.contains("Streamed by"),
            "default block must be suppressed: {sdp}"
        );
    }

    #[test]
    fn dynamic_video_track() {
        let sdp = media_description(96, &VideoTrack { bit_rate: 3 << 20 });
        assert!(sdp.starts_with("m=video 0 RTP/AVP 96\r\n"));
        assert!(sdp.contains("b=AS:3072\r\n"));
        assert!(sdp.contains("a=rtpmap:96 H264/90000\r\n"));
        assert!(!sdp.contains("90000/"), "no channel suffix for video");
    }

    #[test]
    fn static_payload_type_suppresses_rtpmap() {
        let sdp = media_description(0, &PcmuTrack);
        assert_eq!(sdp, "m=audio 0 RTP/AVP 0\r\n");
    }

    #[test]
    fn dynamic_audio_track_carries_channels() {
        let sdp = media_description(97, &AacTrack);
        assert!(sdp.contains("a=rtpmap:97 MPEG4-GENERIC/44100/2\r\n"));
    }

    #[test]
    fn zero_bit_rate_omits_bandwidth() {
        let sdp = media_description(96, &VideoTrack { bit_rate: 0 });
        assert!(!sdp.contains("b=AS:"));
    }
}
