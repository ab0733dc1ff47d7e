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
//! Forward tagged log records to a remote [`syslog`] daemon, squeezing each record's tag into the
//! 32 characters the protocol allows.
//!
//! [`syslog`]: https://en.wikipedia.org/wiki/Syslog
//!
//! # Introduction
//!
//! Log collectors running on a container platform route records by tag, and those tags tend to
//! look like `kube.<namespace>.<pod>.<container>`. When such records are relayed to a syslog
//! daemon, the tag is the natural choice for the RFC [3164] TAG field... which "MUST NOT exceed 32
//! characters". A generated pod name is often that long on its own.
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! Naive truncation of `kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar` leaves you
//! with `kube.kube-system.verylongpodname`, which has thrown away the container (and spent five
//! characters on `kube.`, which tells the reader nothing). [`tag::compact`] drops the `kube.`
//! prefix, trims the pod name (the most redundant part) first, and marks the cut with a `*`:
//!
//! ```rust
//! use truncating_remote_syslog::tag::compact;
//! assert_eq!(
//!     compact("kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar"),
//!     "kube-system.verylongpodn*.sideca"
//! );
//! ```
//!
//! Whatever the input, the result is never longer than 32 characters, & compaction never fails.
//!
//! # Usage
//!
//! Compaction sits in front of a [`Sink`](output::Sink): something that can be configured, format
//! `(tag, time, record)` triples, write the result & be shut down. [`output::TruncatingOutput`]
//! wraps any [`Sink`](output::Sink), compacting tags on their way through. This crate provides one
//! [`Sink`](output::Sink) implementation: [`remote::RemoteSyslogSink`], which sends RFC 3164
//! packets over UDP or TCP.
//!
//! ```no_run
//! use truncating_remote_syslog::config::SinkConfig;
//! use truncating_remote_syslog::output::{Sink, TruncatingOutput};
//! use truncating_remote_syslog::remote::{Record, RemoteSyslogSink};
//!
//! let mut output: TruncatingOutput<RemoteSyslogSink> = TruncatingOutput::new();
//! output
//!     .configure(&SinkConfig::from_params([("host", "logs.example.com"), ("port", "5514")]).unwrap())
//!     .unwrap();
//!
//! let mut record = Record::new();
//! record.insert("message".to_owned(), "Hello, world!".to_owned());
//! let packet = output
//!     .format("kube.default.webapp-7d9c5.nginx", chrono::Utc::now(), &record)
//!     .unwrap();
//! output.write(&packet).unwrap();
//! output.shutdown().unwrap();
//! ```
//!
//! Will send something like this to port 5514 on logs.example.com:
//!
//! ```text
//! <13>Jun 23 16:10:55 hostname default.webapp-7d9c5.nginx: Hello, world!
//! ```

pub mod config;
pub mod error;
pub mod facility;
pub mod output;
pub mod remote;
pub mod rfc3164;
pub mod tag;
pub mod transport;

pub use output::{Sink, TruncatingOutput};
pub use tag::compact;
