// Copyright (C) 2022 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of truncating-remote-syslog.
//
// truncating-remote-syslog is free software: you can redistribute it and/or modify it under the
// terms of the GNU General Public License as published by the Free Software Foundation, either
// version 3 of the License, or (at your option) any later version.
//
// truncating-remote-syslog is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// truncating-remote-syslog.  If not, see <http://www.gnu.org/licenses/>.

//! The syslog transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as the UDP & TCP implementations used to reach a remote daemon.
//!
//! # Examples
//!
//! To send syslog messages over UDP to a daemon listening on port 514 (the default) on localhost:
//!
//! ```rust
//! use truncating_remote_syslog::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use truncating_remote_syslog::transport::UdpTransport;
//! let transpo = UdpTransport::new("some-host.domain.io:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send one syslog packet on this transport mechanism.
    fn send(&self, buf: &[u8]) -> Result<usize>;
    /// Release the underlying connection; further sends may fail.
    fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

fn transport_err(err: std::io::Error) -> Error {
    Error::Transport {
        source: Box::new(err),
        back: Backtrace::new(),
    }
}

/// Resolve `addr` to its first socket address
fn resolve<A: ToSocketAddrs>(addr: A) -> Result<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(transport_err)?
        .next()
        .ok_or_else(|| {
            transport_err(std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "address resolved to nothing",
            ))
        })
}

/// Sending syslog messages via UDP datagrams.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        let addr = resolve(addr)?;
        // Bind to any available port on an interface that can reach `addr`...
        let local: SocketAddr = if addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(transport_err)?;
        // and connect to the syslog daemon at `addr`:
        socket.connect(addr).map_err(transport_err)?;
        Ok(UdpTransport { socket })
    }
    /// Construct a [`Transport`] implementation via UDP at 127.0.0.1:514
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("127.0.0.1:514")
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(transport_err)
    }
}

/// Sending syslog message via TCP streams
///
/// Messages are framed by a trailing newline.
pub struct TcpTransport {
    socket: TcpStream,
}

impl TcpTransport {
    /// Construct a [`Transport`] implementation via TCP at `addr`.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<TcpTransport> {
        Ok(TcpTransport {
            socket: TcpStream::connect(addr).map_err(transport_err)?,
        })
    }
    /// Construct a [`Transport`] implementation via TCP at 127.0.0.1:514
    pub fn try_default() -> Result<TcpTransport> {
        TcpTransport::new("127.0.0.1:514")
    }
}

impl Transport for TcpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        use std::io::Write;
        // `Write` is implemented for `&TcpStream`, which lets us write through a shared reference.
        let mut writer: &TcpStream = &self.socket;
        writer.write_all(buf).map_err(transport_err)?;
        writer.write_all(b"\n").map_err(transport_err)?;
        writer.flush().map_err(transport_err)?;
        Ok(buf.len())
    }
    fn shutdown(&self) -> Result<()> {
        match self.socket.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // The peer beat us to it
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(transport_err(err)),
        }
    }
}
