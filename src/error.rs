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
//! [truncating-remote-syslog](crate) errors

use backtrace::Backtrace;

/// [truncating-remote-syslog](crate) error type
///
/// This crate eschews libraries like [thiserror], [anyhow] & [Snafu] in favor
/// of a straightforward enumeration with a few match arms chosen on the basis what the caller
/// will need to respond.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// A configuration parameter had a value we couldn't make sense of
    BadConfig {
        key: String,
        value: String,
        back: Backtrace,
    },
    /// Non-compliant hostname provided
    BadHostname { name: Vec<u8>, back: Backtrace },
    /// Failed to retrieve an IP address in lieu of a hostname
    BadIpAddress {
        source: local_ip_address::Error,
        back: Backtrace,
    },
    /// Tag too long for the RFC 3164 TAG field
    BadTag { tag: String, back: Backtrace },
    /// I/O error
    Io {
        source: std::io::Error,
        back: Backtrace,
    },
    /// No `host` was given
    MissingHost { back: Backtrace },
    /// A record had no value under the configured message key
    NoMessageField { key: String, back: Backtrace },
    /// The sink was asked to format or write before being configured
    NotConfigured { back: Backtrace },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            source: err,
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadConfig { key, value, .. } => {
                write!(f, "{:?} is not a valid value for {}", value, key)
            }
            Error::BadHostname { name, .. } => {
                write!(f, "{:?} is not an RFC3164-compliant hostname", name)
            }
            Error::BadIpAddress { source, .. } => write!(
                f,
                "While attempting to retrieve an IP address for this host, got {}",
                source
            ),
            Error::BadTag { tag, .. } => write!(f, "{:?} is not an RFC3164-compliant tag", tag),
            Error::Io { source, .. } => write!(f, "I/O error: {}", source),
            Error::MissingHost { .. } => write!(f, "No remote syslog host was configured"),
            Error::NoMessageField { key, .. } => write!(
                f,
                "Record had no {:?} field, and so was not forwarded to a syslog daemon",
                key
            ),
            Error::NotConfigured { .. } => {
                write!(f, "The remote syslog sink has not been configured")
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other truncating-remote-syslog error"),
        }
    }
}

impl std::fmt::Debug for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadConfig { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::BadHostname { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::BadIpAddress { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::BadTag { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::Io { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::MissingHost { back } => write!(f, "{}\n{:#?}", self, back),
            Error::NoMessageField { back, .. } => write!(f, "{}\n{:#?}", self, back),
            Error::NotConfigured { back } => write!(f, "{}\n{:#?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:#?}", self, back),
            err => write!(f, "truncating-remote-syslog error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
