//! Datagram transport underneath the RPC engine.
//!
//! The engine never blocks on a socket directly. It sends through
//! [`Transport::send`] and then repeatedly calls [`Transport::poll`], which
//! moves whatever has arrived into the caller's [`PacketQueue`] and returns.
//! A poll may wait briefly for traffic but must come back on its own, since
//! the retransmission timer is only checked between polls.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use tracing::{debug, trace, warn};

use super::packet_queue::{Packet, PacketQueue};

/// Privileged source port used by default. Many servers only answer
/// MOUNT requests coming from a port below 1024.
pub const DEFAULT_SOURCE_PORT: u16 = 1000;

/// How long a single [`UdpTransport::poll`] waits for a datagram.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Largest datagram accepted from the server.
const MAX_DATAGRAM: usize = 65536;

pub trait Transport {
    /// Sends one datagram to `port` on the server.
    fn send(&mut self, port: u16, datagram: &[u8]) -> io::Result<()>;

    /// Appends any datagrams received from the server to `queue`.
    fn poll(&mut self, queue: &mut PacketQueue) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, port: u16, datagram: &[u8]) -> io::Result<()> {
        (**self).send(port, datagram)
    }

    fn poll(&mut self, queue: &mut PacketQueue) -> io::Result<()> {
        (**self).poll(queue)
    }
}

/// [`Transport`] over a single UDP socket talking to one server.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    server: IpAddr,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds [`DEFAULT_SOURCE_PORT`], or an ephemeral port when that is not
    /// permitted, and talks to `server`.
    pub fn connect(server: IpAddr) -> io::Result<Self> {
        Self::connect_from(server, DEFAULT_SOURCE_PORT)
    }

    /// Binds `source_port`, or an ephemeral port when that is not permitted.
    pub fn connect_from(server: IpAddr, source_port: u16) -> io::Result<Self> {
        let unspecified = match server {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        };
        let socket = match UdpSocket::bind(SocketAddr::new(unspecified, source_port)) {
            Ok(socket) => socket,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::PermissionDenied | io::ErrorKind::AddrInUse
                ) =>
            {
                warn!(source_port, %err, "cannot bind source port, using an ephemeral one");
                UdpSocket::bind(SocketAddr::new(unspecified, 0))?
            }
            Err(err) => return Err(err),
        };
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        debug!(local = ?socket.local_addr().ok(), %server, "udp transport ready");
        Ok(Self { socket, server, buf: vec![0; MAX_DATAGRAM] })
    }

    pub fn server(&self) -> IpAddr {
        self.server
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, port: u16, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send_to(datagram, SocketAddr::new(self.server, port))?;
        if sent != datagram.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "short datagram send"));
        }
        Ok(())
    }

    fn poll(&mut self, queue: &mut PacketQueue) -> io::Result<()> {
        match self.socket.recv_from(&mut self.buf) {
            Ok((len, from)) if from.ip() == self.server => {
                trace!(len, port = from.port(), "datagram received");
                queue.push(Packet::new(from.port(), self.buf[..len].to_vec()));
                Ok(())
            }
            Ok((len, from)) => {
                trace!(len, %from, "ignoring datagram from another host");
                Ok(())
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock
                        | io::ErrorKind::TimedOut
                        | io::ErrorKind::Interrupted
                        | io::ErrorKind::ConnectionRefused
                ) =>
            {
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
