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

//! Remote syslog sink configuration.
//!
//! A [`SinkConfig`] may be assembled in code through [`SinkConfig::builder`]:
//!
//! ```rust
//! use truncating_remote_syslog::config::{Protocol, SinkConfig};
//! use truncating_remote_syslog::facility::Facility;
//!
//! let config = SinkConfig::builder("logs.example.com")
//!     .port(5514)
//!     .protocol(Protocol::Tcp)
//!     .facility(Facility::LOG_LOCAL0)
//!     .build();
//! assert_eq!(config.port(), 5514);
//! ```
//!
//! or from the flat key/value parameters a log collector's `<match>` block would carry:
//!
//! ```rust
//! use truncating_remote_syslog::config::SinkConfig;
//!
//! let config = SinkConfig::from_params([
//!     ("host", "logs.example.com"),
//!     ("port", "5514"),
//!     ("severity", "info"),
//! ]).unwrap();
//! assert_eq!(config.host(), "logs.example.com");
//! ```

use crate::{
    error::{Error, Result},
    facility::{Facility, Level},
};

use backtrace::Backtrace;
use tracing::warn;

/// The standard syslog port
pub const DEFAULT_PORT: u16 = 514;

/// The record field whose value becomes the syslog MSG
pub const DEFAULT_MESSAGE_KEY: &str = "message";

/// How packets reach the remote daemon
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protocol {
    /// one datagram per message
    #[default]
    Udp,
    /// newline-delimited messages on a single stream
    Tcp,
}

impl std::str::FromStr for Protocol {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Protocol::Udp),
            "tcp" => Ok(Protocol::Tcp),
            _ => Err(Error::BadConfig {
                key: "protocol".to_owned(),
                value: s.to_owned(),
                back: Backtrace::new(),
            }),
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Udp => write!(f, "udp"),
            Protocol::Tcp => write!(f, "tcp"),
        }
    }
}

/// Everything a [`RemoteSyslogSink`](crate::remote::RemoteSyslogSink) needs to know
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    host: String,
    port: u16,
    protocol: Protocol,
    /// `None` means "figure it out"
    hostname: Option<String>,
    facility: Facility,
    severity: Level,
    message_key: String,
}

impl SinkConfig {
    pub fn builder<S: Into<String>>(host: S) -> SinkConfigBuilder {
        SinkConfigBuilder {
            imp: SinkConfig {
                host: host.into(),
                port: DEFAULT_PORT,
                protocol: Protocol::default(),
                hostname: None,
                facility: Facility::default(),
                severity: Level::default(),
                message_key: DEFAULT_MESSAGE_KEY.to_owned(),
            },
        }
    }
    /// Build a [`SinkConfig`] from key/value pairs.
    ///
    /// `host` is required; `port`, `protocol`, `hostname`, `facility`, `severity` & `message_key`
    /// are optional. Unrecognized keys are logged & otherwise ignored.
    pub fn from_params<'a, I>(params: I) -> Result<SinkConfig>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut host = None;
        let mut rest = Vec::new();
        for (key, value) in params {
            if key == "host" {
                host = Some(value);
            } else {
                rest.push((key, value));
            }
        }

        let host = host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::MissingHost {
                back: Backtrace::new(),
            })?;
        let mut builder = SinkConfig::builder(host.trim());
        for (key, value) in rest {
            builder = match key {
                "port" => builder.port(value.trim().parse().map_err(|_| Error::BadConfig {
                    key: key.to_owned(),
                    value: value.to_owned(),
                    back: Backtrace::new(),
                })?),
                "protocol" => builder.protocol(value.parse()?),
                "hostname" => builder.hostname(value),
                "facility" => builder.facility(value.parse()?),
                "severity" => builder.severity(value.parse()?),
                "message_key" => builder.message_key(value),
                _ => {
                    warn!("ignoring unknown remote syslog parameter {:?}", key);
                    builder
                }
            };
        }
        Ok(builder.build())
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn port(&self) -> u16 {
        self.port
    }
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }
    pub fn facility(&self) -> Facility {
        self.facility
    }
    pub fn severity(&self) -> Level {
        self.severity
    }
    pub fn message_key(&self) -> &str {
        &self.message_key
    }
    /// `host:port`, suitable for handing to [`std::net::ToSocketAddrs`]
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub struct SinkConfigBuilder {
    imp: SinkConfig,
}

impl SinkConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.imp.port = port;
        self
    }
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.imp.protocol = protocol;
        self
    }
    pub fn hostname<S: Into<String>>(mut self, hostname: S) -> Self {
        self.imp.hostname = Some(hostname.into());
        self
    }
    pub fn facility(mut self, facility: Facility) -> Self {
        self.imp.facility = facility;
        self
    }
    pub fn severity(mut self, severity: Level) -> Self {
        self.imp.severity = severity;
        self
    }
    pub fn message_key<S: Into<String>>(mut self, message_key: S) -> Self {
        self.imp.message_key = message_key.into();
        self
    }
    pub fn build(self) -> SinkConfig {
        self.imp
    }
}
