//! SDP (Session Description Protocol) parsing (RFC 4566 / RFC 8866).
//!
//! Parses the SDP body of a DESCRIBE response (or an ANNOUNCE request)
//! into an ordered list of [`SdpTrack`] descriptors:
//!
//! ```text
//! v=0                                  ← session level ("Title" track)
//! o=- 0 0 IN IP4 0.0.0.0
//! s=Streamed by rtsp-media
//! t=0 0
//! a=range:npt=0-12.5                   ← playback range
//! a=control:*
//! m=video 0 RTP/AVP 96                 ← starts the video track
//! b=AS:3000
//! a=rtpmap:96 H264/90000               ← codec/clock rate
//! a=fmtp:96 packetization-mode=1       ← codec parameters
//! a=control:track1                     ← track control URL
//! m=audio 0 RTP/AVP 97                 ← starts the audio track
//! a=rtpmap:97 MPEG4-GENERIC/44100/2
//! a=control:track2
//! ```
//!
//! Parsing is deliberately permissive — real-world cameras and encoders
//! emit all kinds of almost-SDP. Lines that do not match `<letter>=<value>`
//! are skipped, malformed `m=`/`range`/`rtpmap`/`fmtp` content is dropped
//! or left at defaults, and no parse error is ever surfaced. Callers
//! check [`SdpParser::available`] to learn whether anything usable came
//! out.

use std::collections::BTreeMap;

use crate::media::{CodecProbe, TrackType, payload};
use crate::protocol::describe;

/// Payload-type value meaning "not negotiated yet".
pub const PT_UNSET: u8 = 0xff;

/// One track's worth of parsed SDP state.
///
/// Created per `m=` line (plus the implicit leading Title track), then
/// refined once by the post-parse pass. Read-only afterwards.
#[derive(Debug, Clone)]
pub struct SdpTrack {
    pub track_type: TrackType,
    /// RTP payload type, [`PT_UNSET`] until negotiated.
    pub pt: u8,
    /// Port from the `m=` line (0 when negotiated elsewhere).
    pub port: u16,
    /// Raw `t=` line value.
    pub time_range: String,
    /// Raw `b=` line value.
    pub bandwidth: String,
    /// Playback range in seconds, from `a=range`.
    pub start: f32,
    pub end: f32,
    pub duration: f32,
    /// Codec name from `a=rtpmap` (e.g. `"H264"`).
    pub codec: String,
    /// Media clock rate in Hz; 0 until known.
    pub sample_rate: u32,
    pub channels: u32,
    /// Format parameters from `a=fmtp`, verbatim.
    pub fmtp: String,
    /// Control URL from `a=control`, absolute or relative.
    pub control: String,
    /// `a=` attributes: sorted keys, insertion-ordered values,
    /// duplicates preserved.
    pub attrs: BTreeMap<String, Vec<String>>,
    /// Last-write-wins store for any other `<letter>=` line.
    pub other: BTreeMap<char, String>,
}

impl Default for SdpTrack {
    fn default() -> Self {
        Self {
            track_type: TrackType::Invalid,
            pt: PT_UNSET,
            port: 0,
            time_range: String::new(),
            bandwidth: String::new(),
            start: 0.0,
            end: 0.0,
            duration: 0.0,
            codec: String::new(),
            sample_rate: 0,
            channels: 0,
            fmtp: String::new(),
            control: String::new(),
            attrs: BTreeMap::new(),
            other: BTreeMap::new(),
        }
    }
}

impl SdpTrack {
    /// Registered codec name for this track's payload type.
    pub fn name(&self) -> &'static str {
        payload::name(self.pt)
    }

    /// Resolve this track's control URL against a base URL. An absolute
    /// control value is returned verbatim.
    pub fn control_url(&self, base_url: &str) -> String {
        if self.control.contains("://") {
            return self.control.clone();
        }
        format!("{}/{}", base_url, self.control)
    }

    /// Re-render this track as an SDP block, with `port` substituted
    /// into the `m=` line.
    pub fn to_sdp(&self, port: u16) -> String {
        match self.track_type {
            TrackType::Title => describe::session_description(self.duration, &BTreeMap::new(), 0),
            TrackType::Audio | TrackType::Video => {
                let mut out = format!(
                    "m={} {} RTP/AVP {}\r\n",
                    self.track_type.keyword(),
                    port,
                    self.pt
                );
                if !self.bandwidth.is_empty() {
                    out.push_str(&format!("b={}\r\n", self.bandwidth));
                }
                self.render_attributes(&mut out);
                out
            }
            TrackType::Invalid => String::new(),
        }
    }

    /// Attribute lines in key order, values in arrival order; `control`
    /// is forced last so per-track URLs close the block.
    fn render_attributes(&self, out: &mut String) {
        for (key, values) in &self.attrs {
            if key == "control" {
                continue;
            }
            for value in values {
                if value.is_empty() {
                    out.push_str(&format!("a={key}\r\n"));
                } else {
                    out.push_str(&format!("a={key}:{value}\r\n"));
                }
            }
        }
        if let Some(control) = self.attrs.get("control").and_then(|values| values.last()) {
            out.push_str(&format!("a=control:{control}\r\n"));
        }
    }

    /// Post-parse refinement: range, rtpmap/fmtp filtering, control,
    /// sample-rate fallback.
    fn refine(&mut self, probe: Option<&dyn CodecProbe>) {
        if let Some(range) = self.attrs.get("range").and_then(|values| values.first()) {
            if let Some((start, end)) = parse_range(range) {
                self.start = start;
                self.end = end;
                self.duration = end - start;
            }
        }

        // rtpmap entries whose leading payload type disagrees with the
        // track are removed; the last surviving entry wins. An unset
        // track payload type is adopted from the entry.
        if let Some(values) = self.attrs.remove("rtpmap") {
            let mut kept = Vec::with_capacity(values.len());
            for value in values {
                let entry_pt = leading_u8(&value);
                if self.pt != PT_UNSET && entry_pt != Some(self.pt) {
                    tracing::debug!(track_pt = self.pt, entry = %value, "rtpmap payload type mismatch");
                    continue;
                }
                if let Some((codec, sample_rate, channels)) = parse_rtpmap_value(&value) {
                    if self.pt == PT_UNSET {
                        if let Some(adopted) = entry_pt {
                            self.pt = adopted;
                        }
                    }
                    self.codec = codec;
                    self.sample_rate = sample_rate;
                    if let Some(channels) = channels {
                        self.channels = channels;
                    }
                }
                kept.push(value);
            }
            if !kept.is_empty() {
                self.attrs.insert("rtpmap".to_string(), kept);
            }
        }

        if let Some(values) = self.attrs.remove("fmtp") {
            let mut kept = Vec::with_capacity(values.len());
            for value in values {
                if self.pt != PT_UNSET && leading_u8(&value) != Some(self.pt) {
                    tracing::debug!(track_pt = self.pt, entry = %value, "fmtp payload type mismatch");
                    continue;
                }
                self.fmtp = value
                    .split_once(' ')
                    .map(|(_, rest)| rest.to_string())
                    .unwrap_or_default();
                kept.push(value);
            }
            if !kept.is_empty() {
                self.attrs.insert("fmtp".to_string(), kept);
            }
        }

        if let Some(control) = self.attrs.get("control").and_then(|values| values.first()) {
            self.control = control.clone();
        }

        if self.sample_rate == 0 && self.track_type == TrackType::Video {
            self.sample_rate = 90000;
        } else if self.sample_rate == 0 && self.track_type == TrackType::Audio {
            // some encoders only carry the rate inside fmtp config bytes
            if let Some(probe) = probe {
                if let Some(sample_rate) = probe.sample_rate_from_sdp(self) {
                    self.sample_rate = sample_rate;
                }
            }
        }
    }
}

/// Permissive SDP parser: an ordered list of tracks, Title first.
#[derive(Debug, Default)]
pub struct SdpParser {
    tracks: Vec<SdpTrack>,
}

impl SdpParser {
    /// Parse SDP text. Never fails — see [`available`](Self::available).
    pub fn parse(sdp: &str) -> Self {
        Self::parse_with_probe(sdp, None)
    }

    /// Parse SDP text with a codec-detection fallback for audio tracks
    /// whose sample rate the description omits.
    pub fn parse_with_probe(sdp: &str, probe: Option<&dyn CodecProbe>) -> Self {
        let mut tracks: Vec<SdpTrack> = Vec::new();
        let mut current = SdpTrack {
            track_type: TrackType::Title,
            ..SdpTrack::default()
        };
        // a malformed m= line starts a track that is never kept; the
        // lines that follow it are discarded along with it
        let mut current_kept = true;

        for raw in sdp.split('\n') {
            let line = raw.trim();
            if line.len() < 2 || line.as_bytes()[1] != b'=' {
                continue;
            }
            let letter = line.as_bytes()[0] as char;
            let value = &line[2..];
            match letter {
                't' => current.time_range = value.to_string(),
                'b' => current.bandwidth = value.to_string(),
                'm' => {
                    if current_kept {
                        tracks.push(std::mem::take(&mut current));
                    } else {
                        current = SdpTrack::default();
                    }
                    match parse_media_line(value) {
                        Some((track_type, port, pt)) => {
                            current.track_type = track_type;
                            current.port = port;
                            current.pt = pt;
                            current.sample_rate = payload::clock_rate(pt);
                            current.channels = payload::audio_channels(pt);
                            current_kept = true;
                        }
                        None => {
                            tracing::debug!(line, "unparseable m= line dropped");
                            current_kept = false;
                        }
                    }
                }
                'a' => {
                    let (key, value) = match value.split_once(':') {
                        Some((key, value)) if !key.is_empty() => (key, value),
                        _ => (value, ""),
                    };
                    current
                        .attrs
                        .entry(key.to_string())
                        .or_default()
                        .push(value.to_string());
                }
                other => {
                    current.other.insert(other, value.to_string());
                }
            }
        }
        if current_kept {
            tracks.push(current);
        }

        for track in &mut tracks {
            track.refine(probe);
        }

        SdpParser { tracks }
    }

    /// All tracks in encounter order, Title first.
    pub fn tracks(&self) -> &[SdpTrack] {
        &self.tracks
    }

    /// Whether at least one audio or video track was described.
    pub fn available(&self) -> bool {
        self.track(TrackType::Audio).is_some() || self.track(TrackType::Video).is_some()
    }

    /// First track of the given type.
    pub fn track(&self, track_type: TrackType) -> Option<&SdpTrack> {
        self.tracks
            .iter()
            .find(|track| track.track_type == track_type)
    }

    /// At most one audio and one video track, first-encountered wins,
    /// in encounter order.
    pub fn available_tracks(&self) -> Vec<&SdpTrack> {
        let mut out = Vec::new();
        let mut audio_added = false;
        let mut video_added = false;
        for track in &self.tracks {
            match track.track_type {
                TrackType::Audio if !audio_added => {
                    out.push(track);
                    audio_added = true;
                }
                TrackType::Video if !video_added => {
                    out.push(track);
                    video_added = true;
                }
                _ => {}
            }
        }
        out
    }

    /// Canonical re-render: Title block, then video, then audio,
    /// regardless of the original order.
    pub fn to_sdp(&self) -> String {
        let mut title = String::new();
        let mut video = String::new();
        let mut audio = String::new();
        for track in &self.tracks {
            match track.track_type {
                TrackType::Title => title = track.to_sdp(0),
                TrackType::Video => video = track.to_sdp(0),
                TrackType::Audio => audio = track.to_sdp(0),
                TrackType::Invalid => {}
            }
        }
        format!("{title}{video}{audio}")
    }

    /// Session-level control URL: the Title track's control value when
    /// absolute, else `base_url` unchanged.
    pub fn control_url(&self, base_url: &str) -> String {
        if let Some(title) = self.track(TrackType::Title) {
            if title.control.contains("://") {
                return title.control.clone();
            }
        }
        base_url.to_string()
    }
}

/// `m=<kind> <port>[/<count>] <proto> <pt> ...` — both port forms are
/// tried; anything else drops the line.
fn parse_media_line(value: &str) -> Option<(TrackType, u16, u8)> {
    let mut fields = value.split_whitespace();
    let kind = fields.next()?;
    let port_field = fields.next()?;
    let _proto = fields.next()?;
    let pt_field = fields.next()?;
    let port: u16 = match port_field.split_once('/') {
        Some((port, count)) => {
            count.parse::<u32>().ok()?;
            port.parse().ok()?
        }
        None => port_field.parse().ok()?,
    };
    let pt: u8 = pt_field.parse().ok()?;
    Some((TrackType::from_keyword(kind), port, pt))
}

/// `<name>=<start>-<end>`; the literal `now` means 0, unparseable
/// numbers read as 0.
fn parse_range(value: &str) -> Option<(f32, f32)> {
    let (name, rest) = value.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    let (start, end) = rest.split_once('-')?;
    if start.is_empty() {
        return None;
    }
    let start = if start == "now" { "0" } else { start };
    Some((start.parse().unwrap_or(0.0), end.parse().unwrap_or(0.0)))
}

/// Leading decimal number of an attribute value, if any.
fn leading_u8(value: &str) -> Option<u8> {
    let value = value.trim_start();
    let digits = &value[..value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len())];
    digits.parse().ok()
}

/// `<pt> <codec>/<rate>[/<channels>]`.
fn parse_rtpmap_value(value: &str) -> Option<(String, u32, Option<u32>)> {
    let (_, mapping) = value.split_once(' ')?;
    let mut parts = mapping.splitn(3, '/');
    let codec = parts.next()?.trim();
    if codec.is_empty() {
        return None;
    }
    let sample_rate: u32 = parts.next()?.trim().parse().ok()?;
    let channels = parts.next().and_then(|channels| channels.trim().parse().ok());
    Some((codec.to_string(), sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRACK_SDP: &str = "v=0\r\n\
        o=- 0 0 IN IP4 0.0.0.0\r\n\
        s=Streamed by rtsp-media\r\n\
        c=IN IP4 0.0.0.0\r\n\
        t=0 0\r\n\
        a=range:npt=0-12.5\r\n\
        a=control:*\r\n\
        m=video 0 RTP/AVP 96\r\n\
        b=AS:3000\r\n\
        a=rtpmap:96 H264/90000\r\n\
        a=fmtp:96 packetization-mode=1\r\n\
        a=control:track1\r\n\
        m=audio 0 RTP/AVP 97\r\n\
        a=rtpmap:97 MPEG4-GENERIC/44100/2\r\n\
        a=fmtp:97 streamtype=5;config=1210\r\n\
        a=control:track2\r\n";

    #[test]
    fn parses_title_video_audio() {
        let parser = SdpParser::parse(TWO_TRACK_SDP);
        assert!(parser.available());
        assert_eq!(parser.tracks().len(), 3);

        let title = parser.track(TrackType::Title).unwrap();
        assert_eq!(title.start, 0.0);
        assert_eq!(title.end, 12.5);
        assert_eq!(title.duration, 12.5);
        assert_eq!(title.control, "*");
        assert_eq!(title.time_range, "0 0");

        let video = parser.track(TrackType::Video).unwrap();
        assert_eq!(video.pt, 96);
        assert_eq!(video.codec, "H264");
        assert_eq!(video.sample_rate, 90000);
        assert_eq!(video.bandwidth, "AS:3000");
        assert_eq!(video.fmtp, "packetization-mode=1");
        assert_eq!(video.control, "track1");

        let audio = parser.track(TrackType::Audio).unwrap();
        assert_eq!(audio.pt, 97);
        assert_eq!(audio.codec, "MPEG4-GENERIC");
        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.fmtp, "streamtype=5;config=1210");
    }

    #[test]
    fn junk_lines_are_ignored() {
        let parser = SdpParser::parse("x\r\nnot-a-line\r\n=\r\nzz no equals\r\n");
        assert!(!parser.available());
        assert_eq!(parser.tracks().len(), 1);
        assert_eq!(parser.tracks()[0].track_type, TrackType::Title);
    }

    #[test]
    fn malformed_media_line_discards_following_attributes() {
        let sdp = "v=0\r\n\
            m=video zero RTP/AVP 96\r\n\
            a=rtpmap:96 H264/90000\r\n\
            m=audio 0 RTP/AVP 8\r\n\
            a=control:track9\r\n";
        let parser = SdpParser::parse(sdp);
        assert!(parser.track(TrackType::Video).is_none());
        let audio = parser.track(TrackType::Audio).unwrap();
        assert_eq!(audio.control, "track9");
        // the orphaned rtpmap did not leak onto any surviving track
        assert!(parser.tracks().iter().all(|t| !t.attrs.contains_key("rtpmap")));
    }

    #[test]
    fn media_line_with_port_count() {
        let parser = SdpParser::parse("m=video 5004/2 RTP/AVP 96\r\n");
        let video = parser.track(TrackType::Video).unwrap();
        assert_eq!(video.port, 5004);
        assert_eq!(video.pt, 96);
    }

    #[test]
    fn static_payload_type_defaults_from_registry() {
        let parser = SdpParser::parse("m=audio 0 RTP/AVP 0\r\n");
        let audio = parser.track(TrackType::Audio).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.channels, 1);
    }

    #[test]
    fn mismatched_rtpmap_and_fmtp_are_dropped() {
        let sdp = "m=video 0 RTP/AVP 96\r\n\
            a=rtpmap:97 H265/90000\r\n\
            a=rtpmap:96 H264/90000\r\n\
            a=fmtp:97 tier=1\r\n";
        let parser = SdpParser::parse(sdp);
        let video = parser.track(TrackType::Video).unwrap();
        assert_eq!(video.codec, "H264");
        assert_eq!(video.attrs.get("rtpmap").unwrap().len(), 1);
        assert!(video.fmtp.is_empty());
        assert!(!video.attrs.contains_key("fmtp"));
    }

    #[test]
    fn last_surviving_rtpmap_wins() {
        let sdp = "m=audio 0 RTP/AVP 97\r\n\
            a=rtpmap:97 opus/48000/2\r\n\
            a=rtpmap:97 OPUS/24000/1\r\n";
        let parser = SdpParser::parse(sdp);
        let audio = parser.track(TrackType::Audio).unwrap();
        assert_eq!(audio.codec, "OPUS");
        assert_eq!(audio.sample_rate, 24000);
        assert_eq!(audio.channels, 1);
    }

    #[test]
    fn unset_payload_type_adopts_first_rtpmap_entry() {
        let mut track = SdpTrack {
            track_type: TrackType::Audio,
            ..SdpTrack::default()
        };
        track
            .attrs
            .entry("rtpmap".to_string())
            .or_default()
            .push("97 PCMU/8000".to_string());
        track.refine(None);
        assert_eq!(track.pt, 97);
        assert_eq!(track.codec, "PCMU");
        assert_eq!(track.sample_rate, 8000);
    }

    #[test]
    fn live_range_parses_now_as_zero() {
        let parser = SdpParser::parse("v=0\r\na=range:npt=now-\r\n");
        let title = parser.track(TrackType::Title).unwrap();
        assert_eq!(title.start, 0.0);
        assert_eq!(title.end, 0.0);
        assert_eq!(title.duration, 0.0);
    }

    #[test]
    fn malformed_range_leaves_defaults() {
        let parser = SdpParser::parse("v=0\r\na=range:npt\r\n");
        let title = parser.track(TrackType::Title).unwrap();
        assert_eq!(title.start, 0.0);
        assert_eq!(title.end, 0.0);
    }

    #[test]
    fn video_sample_rate_falls_back_to_90000() {
        // payload type 98 is unmapped; no rtpmap supplies a rate, yet the
        // registry default already covers it
        let parser = SdpParser::parse("m=video 0 RTP/AVP 98\r\n");
        assert_eq!(parser.track(TrackType::Video).unwrap().sample_rate, 90000);
    }

    #[test]
    fn audio_probe_supplies_missing_sample_rate() {
        struct FixedProbe;
        impl CodecProbe for FixedProbe {
            fn sample_rate_from_sdp(&self, _track: &SdpTrack) -> Option<u32> {
                Some(48000)
            }
        }
        let mut track = SdpTrack {
            track_type: TrackType::Audio,
            pt: 97,
            ..SdpTrack::default()
        };
        track.refine(Some(&FixedProbe));
        assert_eq!(track.sample_rate, 48000);
    }

    #[test]
    fn duplicate_tracks_dedupe_first_wins() {
        let sdp = "m=video 0 RTP/AVP 96\r\n\
            a=control:first\r\n\
            m=video 0 RTP/AVP 97\r\n\
            a=control:second\r\n";
        let parser = SdpParser::parse(sdp);
        let available = parser.available_tracks();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].control, "first");
    }

    #[test]
    fn control_url_resolution() {
        let parser = SdpParser::parse(
            "v=0\r\na=control:rtsp://10.0.0.1/live\r\nm=audio 0 RTP/AVP 0\r\na=control:track1\r\n",
        );
        assert_eq!(
            parser.control_url("rtsp://fallback/base"),
            "rtsp://10.0.0.1/live"
        );
        let audio = parser.track(TrackType::Audio).unwrap();
        assert_eq!(
            audio.control_url("rtsp://10.0.0.1/live"),
            "rtsp://10.0.0.1/live/track1"
        );

        let relative = SdpParser::parse("v=0\r\na=control:stream=0\r\n");
        assert_eq!(relative.control_url("rtsp://base"), "rtsp://base");
    }

    #[test]
    fn rerender_orders_title_video_audio() {
        let shuffled = "m=audio 0 RTP/AVP 97\r\n\
            a=rtpmap:97 MPEG4-GENERIC/44100/2\r\n\
            m=video 0 RTP/AVP 96\r\n\
            a=rtpmap:96 H264/90000\r\n\
            a=control:track1\r\n";
        let parser = SdpParser::parse(shuffled);
        let out = parser.to_sdp();
        let video_at = out.find("m=video").expect("video block");
        let audio_at = out.find("m=audio").expect("audio block");
        assert!(out.starts_with("v=0\r\n"), "title block first: {out}");
        assert!(video_at < audio_at, "video before audio: {out}");
        // control closes the video block
        let video_block = &out[video_at..audio_at];
        assert!(video_block.trim_end().ends_with("a=control:track1"));
    }

    #[test]
    fn empty_attribute_renders_without_colon() {
        let parser = SdpParser::parse("m=video 0 RTP/AVP 96\r\na=recvonly\r\n");
        let out = parser.track(TrackType::Video).unwrap().to_sdp(0);
        assert!(out.contains("a=recvonly\r\n"));
        assert!(!out.contains("a=recvonly:"));
    }

    #[test]
    fn other_letters_land_in_side_table_last_wins() {
        let parser = SdpParser::parse("i=first\r\ni=second\r\n");
        let title = parser.track(TrackType::Title).unwrap();
        assert_eq!(title.other.get(&'i').map(String::as_str), Some("second"));
    }

    #[test]
    fn track_name_comes_from_registry() {
        let parser = SdpParser::parse("m=audio 0 RTP/AVP 8\r\n");
        assert_eq!(parser.track(TrackType::Audio).unwrap().name(), "PCMA");
    }
}
