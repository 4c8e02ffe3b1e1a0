//! Paired-port transport provisioning.
//!
//! RTP over UDP needs two server-side ports per session: even for media,
//! odd for control (RFC 3550 §11). This module reserves such pairs from
//! a randomized pool ([`pool`]) and materializes them as bound sockets
//! ([`pair`]) — UDP sockets or listening TCP sockets, with the opposite
//! protocol probe-bound so a reservation is good for either transport.
//!
//! Everything here is synchronous: free-list operations run under a
//! short mutex, and the only blocking points are the OS bind/listen
//! calls themselves.

pub mod pair;
pub mod pool;

pub use pair::{
    BoundSocket, OsBinder, SocketBinder, SocketKind, SocketPair, bind_socket_pair,
    init_port_range, make_socket_pair, make_socket_pair_on,
};
pub use pool::{DEFAULT_PORT_RANGE, PortPair, PortPool};
