//! RTP/RTCP socket-pair construction over reserved port pairs.
//!
//! Transport setup reserves a pair from the pool, then binds the even
//! port for media and the odd port for control — as UDP sockets or as
//! listening TCP sockets. Each bound socket keeps a share of the
//! reservation, so the pair recycles exactly when the last socket is
//! torn down.
//!
//! A reservation must be usable under *both* protocols: after the
//! primary binds succeed, the opposite protocol is probe-bound on the
//! same numeric ports and released. Either failure voids the attempt.
//! [`make_socket_pair`] wraps the whole sequence in a bounded retry.

use std::io;
use std::net::{IpAddr, SocketAddr, TcpListener, UdpSocket};
use std::sync::{Arc, OnceLock};

use socket2::{Domain, Protocol, Socket, Type};

use super::pool::{DEFAULT_PORT_RANGE, PortPair, PortPool};
use crate::error::{Result, RtspError};

/// Total attempts for one [`make_socket_pair`] call.
const MAX_BIND_ATTEMPTS: u32 = 3;

/// Seam over OS socket creation. Production uses [`OsBinder`]; tests
/// inject failures to exercise the retry path.
pub trait SocketBinder {
    fn bind_udp(&self, addr: SocketAddr, reuse_addr: bool) -> io::Result<UdpSocket>;
    fn bind_tcp(&self, addr: SocketAddr, reuse_addr: bool) -> io::Result<TcpListener>;
}

/// Binder backed by the real OS socket API.
pub struct OsBinder;

impl SocketBinder for OsBinder {
    fn bind_udp(&self, addr: SocketAddr, reuse_addr: bool) -> io::Result<UdpSocket> {
        let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(reuse_addr)?;
        socket.bind(&addr.into())?;
        Ok(socket.into())
    }

    fn bind_tcp(&self, addr: SocketAddr, reuse_addr: bool) -> io::Result<TcpListener> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(reuse_addr)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;
        Ok(socket.into())
    }
}

/// A bound socket of either transport protocol.
pub enum SocketKind {
    Udp(UdpSocket),
    Tcp(TcpListener),
}

/// One bound socket of a pair, pinning its port reservation.
pub struct BoundSocket {
    kind: SocketKind,
    reservation: Arc<PortPair>,
}

impl BoundSocket {
    pub fn as_udp(&self) -> Option<&UdpSocket> {
        match &self.kind {
            SocketKind::Udp(socket) => Some(socket),
            SocketKind::Tcp(_) => None,
        }
    }

    pub fn as_tcp(&self) -> Option<&TcpListener> {
        match &self.kind {
            SocketKind::Tcp(listener) => Some(listener),
            SocketKind::Udp(_) => None,
        }
    }

    /// The port reservation this socket keeps alive.
    pub fn reservation(&self) -> &Arc<PortPair> {
        &self.reservation
    }
}

/// Even/odd (RTP, RTCP) sockets bound over one reserved pair.
pub struct SocketPair {
    pub rtp: BoundSocket,
    pub rtcp: BoundSocket,
}

impl SocketPair {
    pub fn rtp_port(&self) -> u16 {
        self.rtp.reservation.rtp_port()
    }

    pub fn rtcp_port(&self) -> u16 {
        self.rtcp.reservation.rtcp_port()
    }
}

/// Bind the even and odd ports of a reservation, both as UDP sockets or
/// both as listening TCP sockets. Either bind failing fails the whole
/// call — no partial pairs.
pub fn bind_socket_pair(
    reservation: &Arc<PortPair>,
    local_ip: IpAddr,
    reuse_addr: bool,
    is_udp: bool,
    binder: &dyn SocketBinder,
) -> Result<SocketPair> {
    let rtp = bind_one(reservation, 0, local_ip, reuse_addr, is_udp, binder)?;
    let rtcp = bind_one(reservation, 1, local_ip, reuse_addr, is_udp, binder)?;
    Ok(SocketPair { rtp, rtcp })
}

fn bind_one(
    reservation: &Arc<PortPair>,
    index: usize,
    local_ip: IpAddr,
    reuse_addr: bool,
    is_udp: bool,
    binder: &dyn SocketBinder,
) -> Result<BoundSocket> {
    let port = if index == 0 {
        reservation.rtp_port()
    } else {
        reservation.rtcp_port()
    };
    let addr = SocketAddr::new(local_ip, port);
    let kind = if is_udp {
        SocketKind::Udp(binder.bind_udp(addr, reuse_addr).map_err(|source| {
            RtspError::SocketBind {
                proto: "udp",
                index,
                port,
                source,
            }
        })?)
    } else {
        SocketKind::Tcp(binder.bind_tcp(addr, reuse_addr).map_err(|source| {
            RtspError::SocketBind {
                proto: "tcp",
                index,
                port,
                source,
            }
        })?)
    };
    Ok(BoundSocket {
        kind,
        reservation: reservation.clone(),
    })
}

static UDP_POOL: OnceLock<PortPool> = OnceLock::new();
static TCP_POOL: OnceLock<PortPool> = OnceLock::new();
static PORT_RANGE: OnceLock<String> = OnceLock::new();

/// Configure the shared `"min-max"` port range. Must be called before
/// the first allocation; later calls (or calls after a pool is already
/// seeded) have no effect beyond validation.
pub fn init_port_range(range: &str) -> Result<()> {
    // validate eagerly so a bad range is reported at configuration time
    PortPool::from_range(range)?;
    let _ = PORT_RANGE.set(range.to_string());
    Ok(())
}

fn pool_from_config() -> PortPool {
    let range = PORT_RANGE
        .get()
        .map(String::as_str)
        .unwrap_or(DEFAULT_PORT_RANGE);
    match PortPool::from_range(range) {
        Ok(pool) => pool,
        Err(error) => {
            tracing::warn!(%error, range, "bad port range, using defaults");
            PortPool::with_bounds(30000, 35000)
        }
    }
}

/// UDP-oriented and TCP-oriented pools share the seeding algorithm and
/// range but keep disjoint free lists.
fn udp_pool() -> &'static PortPool {
    UDP_POOL.get_or_init(pool_from_config)
}

fn tcp_pool() -> &'static PortPool {
    TCP_POOL.get_or_init(pool_from_config)
}

/// Reserve a port pair and open RTP/RTCP sockets on it, with `is_udp`
/// selecting the primary protocol (and which pool serves the pair).
///
/// The opposite protocol is probe-bound on the same ports so the
/// reservation is guaranteed usable either way. The allocate+bind
/// sequence retries up to 3 times in total; the final failure is
/// returned.
pub fn make_socket_pair(local_ip: IpAddr, reuse_addr: bool, is_udp: bool) -> Result<SocketPair> {
    let pool = if is_udp { udp_pool() } else { tcp_pool() };
    make_socket_pair_on(pool, &OsBinder, local_ip, reuse_addr, is_udp)
}

/// [`make_socket_pair`] against an explicit pool and binder.
pub fn make_socket_pair_on(
    pool: &PortPool,
    binder: &dyn SocketBinder,
    local_ip: IpAddr,
    reuse_addr: bool,
    is_udp: bool,
) -> Result<SocketPair> {
    let mut attempt = 0;
    loop {
        match allocate_and_bind(pool, binder, local_ip, reuse_addr, is_udp) {
            Ok(pair) => return Ok(pair),
            Err(error) => {
                attempt += 1;
                if attempt == MAX_BIND_ATTEMPTS {
                    return Err(error);
                }
                tracing::warn!(%error, attempt, "open socket failed, retrying");
            }
        }
    }
}

fn allocate_and_bind(
    pool: &PortPool,
    binder: &dyn SocketBinder,
    local_ip: IpAddr,
    reuse_addr: bool,
    is_udp: bool,
) -> Result<SocketPair> {
    let reservation = pool.allocate()?;
    let pair = bind_socket_pair(&reservation, local_ip, reuse_addr, is_udp, binder)?;
    // both transport protocols must open on the reserved ports; the
    // probe sockets are released immediately, the reservation stays
    // pinned by the primary pair
    let _probe = bind_socket_pair(&reservation, local_ip, reuse_addr, !is_udp, binder)?;
    Ok(pair)
}
