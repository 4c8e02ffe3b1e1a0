//! Media signaling and transport core for RTSP streaming engines.
//!
//! Three independent pieces compose into a session setup path:
//!
//! - **SDP** ([`protocol`]): parse session descriptions into track
//!   descriptors, and generate them from negotiated tracks.
//! - **RTP wire format** ([`media::rtp`]): bounds-checked decoding of
//!   the RTP header layout, RTP/RTCP classification, and interleaved
//!   framing.
//! - **Port pairing** ([`transport`]): a randomized pool of reserved
//!   even/odd port pairs with reference-counted recycling and bounded
//!   bind retry.
//!
//! The RTSP request/response state machine, codecs, and jitter handling
//! live elsewhere — this crate only models the representations and
//! mechanics they drive.

pub mod error;
pub mod media;
pub mod protocol;
pub mod transport;

pub use error::{Result, RtspError};
pub use media::{AudioTrack, CodecId, CodecProbe, Track, TrackType};
pub use protocol::{SdpParser, SdpTrack};
pub use transport::{PortPool, SocketPair, make_socket_pair};
