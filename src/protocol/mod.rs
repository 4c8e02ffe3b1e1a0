//! SDP signaling text protocol (RFC 4566 / RFC 8866).
//!
//! SDP is the negotiation half of a streaming session: a DESCRIBE-style
//! exchange carries a text body that names each media track, its codec,
//! payload type, and control URL. This module handles both directions:
//!
//! - [`sdp`]: parse arbitrary (often noncompliant) SDP text into
//!   [`sdp::SdpTrack`] descriptors.
//! - [`describe`]: generate SDP text from negotiated tracks.
//!
//! Parsing and generation are independent — the parser accepts far more
//! than the builders will ever emit, on purpose.

pub mod describe;
pub mod sdp;

pub use sdp::{SdpParser, SdpTrack};
