//! Error types for the media signaling/transport core.

use std::io;

/// Errors that can occur in the signaling and transport core.
///
/// Variants map to specific failure modes:
///
/// - **Transport**: [`Io`](Self::Io) — socket/network failures.
/// - **Port pool**: [`PortPoolExhausted`](Self::PortPoolExhausted),
///   [`InvalidPortRange`](Self::InvalidPortRange),
///   [`SocketBind`](Self::SocketBind).
///
/// SDP parsing deliberately has no error variant: malformed lines are
/// dropped or left at defaults for interoperability with noncompliant
/// peers. Payload-registry lookups return documented sentinels instead
/// of errors.
#[derive(Debug, thiserror::Error)]
pub enum RtspError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The port-pair pool has no free pair left.
    #[error("none reserved port in pool")]
    PortPoolExhausted,

    /// A `"min-max"` port range too narrow to seed the pool
    /// (requires `max >= min + 35`).
    #[error("invalid port range {0:?}")]
    InvalidPortRange(String),

    /// Binding one socket of an RTP/RTCP pair failed.
    #[error("open {proto} socket[{index}] on port {port} failed: {source}")]
    SocketBind {
        /// `"udp"` or `"tcp"`.
        proto: &'static str,
        /// 0 for the even (RTP) socket, 1 for the odd (RTCP) socket.
        index: usize,
        port: u16,
        #[source]
        source: io::Error,
    },
}

/// Convenience alias for `Result<T, RtspError>`.
pub type Result<T> = std::result::Result<T, RtspError>;
