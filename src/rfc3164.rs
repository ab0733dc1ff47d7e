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

//! RFC 3164-compliant syslog message formatting
//! ============================================
//!
//! # Introduction
//!
//! [`Rfc3164`] produces syslog packets according to RFC [3164] (AKA the BSD syslog protocol),
//! which is what most remote collectors listening on port 514 still expect by default.
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! Unlike a local logger, whose TAG is fixed at the process name, a forwarder has a different TAG
//! for every record it relays, so the tag is an argument to [`Rfc3164::format`] rather than a
//! property of the formatter.

use crate::{
    error::{Error, Result},
    facility::{Facility, Level},
    tag::MAX_TAG_LEN,
};

use backtrace::Backtrace;
use bytes::BufMut;
use chrono::prelude::*;

type StdResult<T, E> = std::result::Result<T, E>;

/// Produce a [`Vec`] of bytes from an [`OsString`](std::ffi::OsString).
#[cfg(unix)]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    use std::os::unix::ffi::OsStringExt;
    s.into_vec()
}

#[cfg(not(unix))]
fn bytes_from_os_str(s: std::ffi::OsString) -> Vec<u8> {
    s.to_string_lossy().as_bytes().to_vec()
}

/// A `Vec<u8>` instance with the additional constraint that its contents be ASCII above the value
/// 32 (space)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rfc3164Hostname(Vec<u8>);

impl Rfc3164Hostname {
    /// An RFC 3164-compliant hostname is made-up of ASCII above 32/space. An IPv4 or IPv6 address
    /// is also acceptable, so no attempt is made to restrict `bytes` to letters, digits & `-`.
    pub fn new(bytes: Vec<u8>) -> Result<Rfc3164Hostname> {
        if !bytes.is_empty() && bytes.iter().all(|&x| x > 32 && x < 128) {
            Ok(Rfc3164Hostname(bytes))
        } else {
            Err(Error::BadHostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
    /// Remove the domain (if any) from a host name
    ///
    /// This method will remove anything including & after the first `.` in `bytes`.
    fn strip_domain(mut bytes: Vec<u8>) -> Vec<u8> {
        if let Some(idx) = bytes.iter().position(|&x| x == b'.') {
            bytes.truncate(idx);
        }
        bytes
    }
    /// Attempt to figure-out an RFC [3164]-compliant hostname.
    ///
    /// "The Domain Name MUST NOT be included in the HOSTNAME field", so we take the host name,
    /// strip the domain and, failing that, fall back to this host's IP address.
    ///
    /// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
    pub fn try_default() -> Result<Rfc3164Hostname> {
        hostname::get()
            .map_err(|err| err.into())
            .and_then(|hn| {
                Rfc3164Hostname::new(Rfc3164Hostname::strip_domain(bytes_from_os_str(hn)))
            })
            // 👇 will return the Ok(Rfc3164Hostname), or call the closure :=> StdResult<Rfc3164Hostname, Error>
            .or_else(|_err| {
                let ip: StdResult<std::net::IpAddr, Error> =
                    local_ip_address::local_ip().map_err(|err| Error::BadIpAddress {
                        source: err,
                        back: Backtrace::new(),
                    });
                ip.map(|ip| Rfc3164Hostname(ip.to_string().into_bytes()))
            })
    }
}

impl std::convert::TryFrom<String> for Rfc3164Hostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Rfc3164Hostname::new(x.into_bytes())
    }
}

/// A syslog formatter that produces RFC [3164]-conformant syslog messages.
///
/// [3164]: https://datatracker.ietf.org/doc/html/rfc3164
///
/// The packet looks like `<PRI>Mmm dd HH:MM:SS HOSTNAME TAG: MESSAGE`. The timestamp is rendered
/// in local time, as the RFC requires.
pub struct Rfc3164 {
    facility: Facility,
    severity: Level,
    hostname: Rfc3164Hostname,
}

impl Rfc3164 {
    pub fn new(facility: Facility, severity: Level, hostname: Rfc3164Hostname) -> Rfc3164 {
        Rfc3164 {
            facility,
            severity,
            hostname,
        }
    }
    /// Format a single packet.
    ///
    /// `tag` must already fit the TAG field; callers with arbitrary tags should run them through
    /// [`compact`](crate::tag::compact) first.
    pub fn format(&self, tag: &str, msg: &str, timestamp: DateTime<Utc>) -> Result<Vec<u8>> {
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(Error::BadTag {
                tag: tag.to_owned(),
                back: Backtrace::new(),
            });
        }

        let mut buf = format!(
            "<{}>{} ",
            self.facility as u8 | self.severity as u8,
            timestamp.with_timezone(&Local).format("%b %e %H:%M:%S"),
        )
        .into_bytes();
        buf.reserve(self.hostname.0.len() + tag.len() + msg.len() + 3);

        buf.put_slice(&self.hostname.0);
        buf.put_u8(b' ');
        buf.put_slice(tag.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(msg.as_bytes());

        Ok(buf)
    }
}
