//! Integration tests: SDP generate → parse round trip, and port-pair
//! provisioning over real loopback sockets.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

use rtsp_media::media::rtp;
use rtsp_media::protocol::describe;
use rtsp_media::transport::{OsBinder, PortPool, make_socket_pair_on};
use rtsp_media::{AudioTrack, CodecId, SdpParser, Track, TrackType};

struct H264Track;

impl Track for H264Track {
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
        2 << 20
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
        48000
    }
    fn channels(&self) -> u32 {
        2
    }
}

#[test]
fn generated_sdp_round_trips_through_the_parser() {
    let mut body = describe::session_description(30.0, &BTreeMap::new(), 0);
    body.push_str(&describe::media_description(96, &H264Track));
    body.push_str(&describe::media_description(97, &AacTrack));

    let parser = SdpParser::parse(&body);
    assert!(parser.available(), "generated SDP must be usable: {body}");

    let title = parser.track(TrackType::Title).expect("title track");
    assert_eq!(title.duration, 30.0);
    assert_eq!(title.control, "*");

    let video = parser.track(TrackType::Video).expect("video track");
    assert_eq!(video.pt, 96);
    assert_eq!(video.codec, "H264");
    assert_eq!(video.sample_rate, 90000);
    assert_eq!(video.bandwidth, "AS:2048");

    let audio = parser.track(TrackType::Audio).expect("audio track");
    assert_eq!(audio.pt, 97);
    assert_eq!(audio.codec, "MPEG4-GENERIC");
    assert_eq!(audio.sample_rate, 48000);
    assert_eq!(audio.channels, 2);

    // the parser's canonical re-render is itself parseable
    let reparsed = SdpParser::parse(&parser.to_sdp());
    assert!(reparsed.available());
    assert_eq!(reparsed.track(TrackType::Video).expect("video").pt, 96);
    assert_eq!(reparsed.track(TrackType::Audio).expect("audio").pt, 97);
}

#[test]
fn static_payload_type_round_trips_via_registry_defaults() {
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

    // pt 0 is static: no rtpmap is emitted, the parser must recover the
    // clocking from the registry alone
    let body = describe::media_description(0, &PcmuTrack);
    assert!(!body.contains("rtpmap"));

    let parser = SdpParser::parse(&body);
    let audio = parser.track(TrackType::Audio).expect("audio track");
    assert_eq!(audio.pt, 0);
    assert_eq!(audio.sample_rate, 8000);
    assert_eq!(audio.channels, 1);
}

#[test]
fn interleaved_frame_survives_classification_and_decode() {
    let packet = rtp::RtpPacket::build(2, true, 96, 100, 180_000, 0x4D454449, b"frame", 90000);

    let frame = packet.frame();
    assert_eq!(frame[0], b'$');
    assert_eq!(frame[1], 2);

    let datagram = packet.datagram();
    assert!(rtp::is_rtp(datagram));
    assert!(!rtp::is_rtcp(datagram));
    assert_eq!(rtp::read_ssrc(datagram), Some(0x4D454449));

    let header = rtp::RtpHeader::parse(datagram).expect("parseable datagram");
    assert_eq!(header.sequence(), 100);
    assert_eq!(header.payload().expect("payload"), &b"frame"[..]);
    assert_eq!(packet.timestamp_ms(), 2000);
}

#[test]
fn port_pairs_provision_and_recycle_over_loopback() {
    let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let pool = PortPool::from_range("44000-44100").expect("valid range");
    let total = pool.free_pairs();

    let first = make_socket_pair_on(&pool, &OsBinder, localhost, true, true).expect("udp pair");
    let second = make_socket_pair_on(&pool, &OsBinder, localhost, true, false).expect("tcp pair");

    assert_eq!(first.rtp_port() % 2, 0);
    assert_eq!(first.rtcp_port(), first.rtp_port() + 1);
    assert_ne!(first.rtp_port(), second.rtp_port());
    assert_eq!(pool.free_pairs(), total - 2);

    // RTP flows through the even UDP socket
    let udp = first.rtp.as_udp().expect("udp socket");
    let sender = std::net::UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("sender");
    let datagram = rtp::write_fixed_header(false, 96, 1, 0, 0xABCD);
    sender
        .send_to(&datagram, (Ipv4Addr::LOCALHOST, first.rtp_port()))
        .expect("send");
    let mut buf = [0u8; 64];
    let (received, _) = udp.recv_from(&mut buf).expect("recv");
    assert!(rtp::is_rtp(&buf[..received]));

    drop(first);
    drop(second);
    assert_eq!(pool.free_pairs(), total, "pairs recycled on teardown");
}
