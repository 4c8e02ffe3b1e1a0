//! RTP wire format (RFC 3550 §5.1) and interleaved framing (RFC 2326 §10.12).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       Sequence Number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                             SSRC                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                 contributing sources (CC × 32 bit)            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    profile-defined value      |     extension length          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                payload ...              | padding | pad count |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! [`RtpHeader`] is a borrowed, bounds-checked view over a received
//! datagram — input buffers come off the network, so every computed
//! offset is validated against the slice before use. A short or
//! inconsistent buffer surfaces as a non-positive
//! [`payload_size`](RtpHeader::payload_size), the "drop this packet"
//! signal, never as a panic.
//!
//! RTP and RTCP share one channel; [`is_rtp`]/[`is_rtcp`] split them by
//! the payload-type range (RFC 5761 §4). For byte-stream (interleaved)
//! transport, a 4-byte `$` prefix frames each datagram
//! ([`interleaved_prefix`], RFC 2326 §10.12).

use std::fmt;

/// Supported RTP version.
pub const RTP_VERSION: u8 = 2;
/// Fixed header length in bytes.
pub const RTP_HEADER_SIZE: usize = 12;
/// Interleaved (`$`) framing prefix length.
pub const INTERLEAVED_PREFIX_SIZE: usize = 4;

/// Payload types carried by RTCP packets on a shared channel
/// (RFC 5761 §4).
const RTCP_PT_RANGE: std::ops::Range<u8> = 64..96;

/// Borrowed view over a complete RTP datagram.
///
/// Construction via [`parse`](Self::parse) guarantees the fixed 12-byte
/// header is present; the variable regions (csrc list, extension,
/// padding) are re-validated on every access.
#[derive(Clone, Copy)]
pub struct RtpHeader<'a> {
    buf: &'a [u8],
}

impl<'a> RtpHeader<'a> {
    /// Borrow a view over an RTP datagram. `None` when the buffer cannot
    /// hold the fixed header.
    pub fn parse(buf: &'a [u8]) -> Option<Self> {
        if buf.len() < RTP_HEADER_SIZE {
            return None;
        }
        Some(Self { buf })
    }

    pub fn version(&self) -> u8 {
        self.buf[0] >> 6
    }

    pub fn has_padding(&self) -> bool {
        self.buf[0] & 0x20 != 0
    }

    pub fn has_extension(&self) -> bool {
        self.buf[0] & 0x10 != 0
    }

    pub fn csrc_count(&self) -> u8 {
        self.buf[0] & 0x0f
    }

    pub fn marker(&self) -> bool {
        self.buf[1] & 0x80 != 0
    }

    pub fn payload_type(&self) -> u8 {
        self.buf[1] & 0x7f
    }

    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes([self.buf[2], self.buf[3]])
    }

    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]])
    }

    pub fn ssrc(&self) -> u32 {
        u32::from_be_bytes([self.buf[8], self.buf[9], self.buf[10], self.buf[11]])
    }

    /// Bytes occupied by the csrc list (4 per entry).
    pub fn csrc_size(&self) -> usize {
        (self.csrc_count() as usize) << 2
    }

    /// The csrc identifier bytes, truncated when the buffer is short.
    pub fn csrc(&self) -> &'a [u8] {
        let end = (RTP_HEADER_SIZE + self.csrc_size()).min(self.buf.len());
        &self.buf[RTP_HEADER_SIZE..end]
    }

    fn ext_header_offset(&self) -> usize {
        RTP_HEADER_SIZE + self.csrc_size()
    }

    /// Extension block size in bytes, excluding the 4-byte sub-header.
    ///
    /// Reads the 16-bit word count from the sub-header; a buffer too
    /// short to hold the sub-header reads as 0 and the signed payload
    /// arithmetic flags the inconsistency.
    pub fn ext_size(&self) -> usize {
        if !self.has_extension() {
            return 0;
        }
        let offset = self.ext_header_offset();
        match self.buf.get(offset + 2..offset + 4) {
            Some(words) => (u16::from_be_bytes([words[0], words[1]]) as usize) << 2,
            None => 0,
        }
    }

    /// The profile-defined 16-bit value in the extension sub-header,
    /// 0 when absent.
    pub fn ext_reserved(&self) -> u16 {
        if !self.has_extension() {
            return 0;
        }
        let offset = self.ext_header_offset();
        match self.buf.get(offset..offset + 2) {
            Some(value) => u16::from_be_bytes([value[0], value[1]]),
            None => 0,
        }
    }

    /// Extension payload bytes, truncated when the buffer is short.
    pub fn ext_data(&self) -> &'a [u8] {
        if !self.has_extension() {
            return &[];
        }
        let start = (self.ext_header_offset() + 4).min(self.buf.len());
        let end = (start + self.ext_size()).min(self.buf.len());
        &self.buf[start..end]
    }

    /// Payload offset counted from the end of the fixed header: the csrc
    /// list plus, when present, the extension sub-header and block.
    pub fn payload_offset(&self) -> usize {
        self.csrc_size()
            + if self.has_extension() {
                4 + self.ext_size()
            } else {
                0
            }
    }

    /// Trailing padding length: the buffer's last byte when the padding
    /// flag is set.
    pub fn padding_size(&self) -> usize {
        if !self.has_padding() {
            return 0;
        }
        self.buf.last().copied().unwrap_or(0) as usize
    }

    /// Signed payload size. Non-positive means the datagram is truncated
    /// or inconsistent and must be discarded, not indexed.
    pub fn payload_size(&self) -> isize {
        self.buf.len() as isize
            - self.payload_offset() as isize
            - self.padding_size() as isize
            - RTP_HEADER_SIZE as isize
    }

    /// Payload bytes, `None` when the computed region is empty or does
    /// not fit the buffer.
    pub fn payload(&self) -> Option<&'a [u8]> {
        let size = self.payload_size();
        if size <= 0 {
            return None;
        }
        let start = RTP_HEADER_SIZE + self.payload_offset();
        self.buf.get(start..start + size as usize)
    }
}

impl fmt::Display for RtpHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "version:{}", self.version())?;
        writeln!(f, "padding:{}", self.padding_size())?;
        writeln!(f, "ext:{}", self.ext_size())?;
        writeln!(f, "csrc:{}", self.csrc_size())?;
        writeln!(f, "mark:{}", self.marker() as u8)?;
        writeln!(f, "pt:{}", self.payload_type())?;
        writeln!(f, "seq:{}", self.sequence())?;
        writeln!(f, "stamp:{}", self.timestamp())?;
        writeln!(f, "ssrc:{}", self.ssrc())?;
        writeln!(f, "rtp size:{}", self.buf.len())?;
        writeln!(f, "payload offset:{}", self.payload_offset())?;
        write!(f, "payload size:{}", self.payload_size())
    }
}

impl fmt::Debug for RtpHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Whether `buf` looks like an RTP datagram: supported version and a
/// payload type outside the RTCP range.
pub fn is_rtp(buf: &[u8]) -> bool {
    if buf.len() < 2 {
        return false;
    }
    buf[0] >> 6 == RTP_VERSION && !RTCP_PT_RANGE.contains(&(buf[1] & 0x7f))
}

/// Whether `buf` carries an RTCP packet type on a shared channel.
pub fn is_rtcp(buf: &[u8]) -> bool {
    if buf.len() < 2 {
        return false;
    }
    RTCP_PT_RANGE.contains(&(buf[1] & 0x7f))
}

/// Version-agnostic fast path: the big-endian SSRC at byte offset 8.
/// `None` when the buffer cannot hold the fixed header.
pub fn read_ssrc(buf: &[u8]) -> Option<u32> {
    let raw = buf.get(8..12)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Render an SSRC as 8 uppercase hex digits.
pub fn format_ssrc(ssrc: u32) -> String {
    format!("{ssrc:08X}")
}

/// Build the 4-byte framing prefix for interleaved transport:
/// `'$'`, channel id, 16-bit big-endian payload length.
pub fn interleaved_prefix(size: u16, channel: u8) -> [u8; INTERLEAVED_PREFIX_SIZE] {
    let len = size.to_be_bytes();
    [b'$', channel, len[0], len[1]]
}

/// Serialize a 12-byte fixed header. Padding, extension, and csrc count
/// are always clear — senders that need them append the regions
/// themselves.
pub fn write_fixed_header(
    marker: bool,
    pt: u8,
    sequence: u16,
    timestamp: u32,
    ssrc: u32,
) -> [u8; RTP_HEADER_SIZE] {
    let mut header = [0u8; RTP_HEADER_SIZE];
    header[0] = RTP_VERSION << 6;
    header[1] = ((marker as u8) << 7) | (pt & 0x7f);
    header[2..4].copy_from_slice(&sequence.to_be_bytes());
    header[4..8].copy_from_slice(&timestamp.to_be_bytes());
    header[8..12].copy_from_slice(&ssrc.to_be_bytes());
    header
}

/// One owned media packet: interleaved framing prefix plus RTP datagram,
/// with the out-of-band clock metadata needed to place it on a timeline.
pub struct RtpPacket {
    buf: Vec<u8>,
    /// Media clock rate in Hz, used for millisecond conversion.
    pub sample_rate: u32,
    /// NTP-mapped wall-clock timestamp in milliseconds, when known.
    pub ntp_stamp_ms: Option<u64>,
}

impl RtpPacket {
    /// Take ownership of a framed packet (`$` prefix + datagram).
    /// `None` when the buffer cannot hold the prefix and fixed header.
    pub fn from_frame(buf: Vec<u8>, sample_rate: u32) -> Option<Self> {
        if buf.len() < INTERLEAVED_PREFIX_SIZE + RTP_HEADER_SIZE {
            return None;
        }
        Some(Self {
            buf,
            sample_rate,
            ntp_stamp_ms: None,
        })
    }

    /// Compose a framed packet from parts.
    pub fn build(
        channel: u8,
        marker: bool,
        pt: u8,
        sequence: u16,
        timestamp: u32,
        ssrc: u32,
        payload: &[u8],
        sample_rate: u32,
    ) -> Self {
        let datagram_len = RTP_HEADER_SIZE + payload.len();
        let mut buf = Vec::with_capacity(INTERLEAVED_PREFIX_SIZE + datagram_len);
        buf.extend_from_slice(&interleaved_prefix(datagram_len as u16, channel));
        buf.extend_from_slice(&write_fixed_header(marker, pt, sequence, timestamp, ssrc));
        buf.extend_from_slice(payload);
        Self {
            buf,
            sample_rate,
            ntp_stamp_ms: None,
        }
    }

    /// The full framed bytes as sent on a byte-stream transport.
    pub fn frame(&self) -> &[u8] {
        &self.buf
    }

    /// The RTP datagram without the framing prefix.
    pub fn datagram(&self) -> &[u8] {
        &self.buf[INTERLEAVED_PREFIX_SIZE..]
    }

    pub fn header(&self) -> RtpHeader<'_> {
        // length invariant established at construction
        RtpHeader {
            buf: self.datagram(),
        }
    }

    pub fn sequence(&self) -> u16 {
        self.header().sequence()
    }

    pub fn timestamp(&self) -> u32 {
        self.header().timestamp()
    }

    pub fn ssrc(&self) -> u32 {
        self.header().ssrc()
    }

    pub fn payload(&self) -> Option<&[u8]> {
        self.header().payload()
    }

    pub fn payload_size(&self) -> isize {
        self.header().payload_size()
    }

    /// Media timestamp in milliseconds: the NTP-mapped value when
    /// attached, else the RTP timestamp scaled by the sample rate
    /// (truncating integer arithmetic).
    pub fn timestamp_ms(&self) -> u64 {
        if let Some(ntp) = self.ntp_stamp_ms {
            return ntp;
        }
        if self.sample_rate == 0 {
            return 0;
        }
        self.timestamp() as u64 * 1000 / self.sample_rate as u64
    }
}

impl fmt::Display for RtpPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.header(), f)
    }
}
