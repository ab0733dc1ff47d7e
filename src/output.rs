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

//! Log sinks, and the tag-compacting wrapper around them.
//!
//! [`Sink`] is the contract between a log forwarder & whatever actually moves records off-host:
//! configure it once, hand it `(tag, time, record)` triples to format, write what it formatted,
//! and shut it down. [`TruncatingOutput`] is itself a [`Sink`]; it owns a delegate [`Sink`] and
//! passes everything through untouched, save that tags are [compacted] on the way to
//! [`Sink::format`].
//!
//! [compacted]: crate::tag::compact
//!
//! ```rust
//! use truncating_remote_syslog::output::{Sink, TruncatingOutput};
//! use truncating_remote_syslog::remote::{RemoteSyslogSink, Record};
//! use truncating_remote_syslog::config::SinkConfig;
//!
//! let mut output: TruncatingOutput<RemoteSyslogSink> = TruncatingOutput::new();
//! output.configure(&SinkConfig::builder("127.0.0.1").hostname("bree").build()).unwrap();
//!
//! let mut record = Record::new();
//! record.insert("message".to_owned(), "Hello, world!".to_owned());
//! let packet = output
//!     .format(
//!         "kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar",
//!         chrono::Utc::now(),
//!         &record,
//!     )
//!     .unwrap();
//! assert!(std::str::from_utf8(&packet).unwrap().contains(" kube-system.verylongpodn*.sideca: "));
//! output.shutdown().unwrap();
//! ```

use crate::tag::{classify, truncate, KUBE_PREFIX};

use chrono::prelude::*;
use tracing::debug;

use std::ops::Deref;

type StdResult<T, E> = std::result::Result<T, E>;

/// Operations all sinks must support
///
/// The associated `Output` type plays the same role here as it does for a syslog formatter: the
/// thing handed to [`Sink::write`] must have come out of [`Sink::format`], and nothing else
/// will type-check.
pub trait Sink {
    type Config: ?Sized;
    type Record: ?Sized;
    type Output: Deref<Target = [u8]>;
    type Error: std::error::Error + 'static;
    /// One-time setup
    fn configure(&mut self, config: &Self::Config) -> StdResult<(), Self::Error>;
    /// Render a single record
    fn format(
        &self,
        tag: &str,
        time: DateTime<Utc>,
        record: &Self::Record,
    ) -> StdResult<Self::Output, Self::Error>;
    /// Deliver a rendered record; returns the number of bytes sent
    fn write(&self, output: &Self::Output) -> StdResult<usize, Self::Error>;
    /// Release whatever resources the sink holds
    fn shutdown(&mut self) -> StdResult<(), Self::Error>;
}

/// A [`Sink`] that compacts every tag to fit the syslog TAG field before handing the record to
/// its delegate.
///
/// Compaction cannot cause a record to be dropped: a tag that claims to be
/// `kube.<namespace>.<pod>.<container>` but isn't is simply cut to 32 characters.
pub struct TruncatingOutput<S: Sink> {
    delegate: S,
}

impl<S: Sink + Default> TruncatingOutput<S> {
    /// Construct a [`TruncatingOutput`] around a freshly-constructed, unconfigured delegate
    pub fn new() -> Self {
        TruncatingOutput {
            delegate: S::default(),
        }
    }
}

impl<S: Sink + Default> std::default::Default for TruncatingOutput<S> {
    fn default() -> Self {
        TruncatingOutput::new()
    }
}

impl<S: Sink> TruncatingOutput<S> {
    pub fn with_delegate(delegate: S) -> Self {
        TruncatingOutput { delegate }
    }
    pub fn delegate(&self) -> &S {
        &self.delegate
    }
    pub fn into_inner(self) -> S {
        self.delegate
    }
}

impl<S: Sink> Sink for TruncatingOutput<S> {
    type Config = S::Config;
    type Record = S::Record;
    type Output = S::Output;
    type Error = S::Error;

    fn configure(&mut self, config: &Self::Config) -> StdResult<(), Self::Error> {
        self.delegate.configure(config)
    }

    fn format(
        &self,
        tag: &str,
        time: DateTime<Utc>,
        record: &Self::Record,
    ) -> StdResult<Self::Output, Self::Error> {
        let tag = match classify(tag) {
            Some(parsed) => parsed.compact(),
            None => {
                debug!(
                    "{:?} begins with {:?} but lacks namespace, pod & container fields; \
                     falling back to plain truncation",
                    tag, KUBE_PREFIX
                );
                truncate(tag)
            }
        };
        self.delegate.format(&tag, time, record)
    }

    fn write(&self, output: &Self::Output) -> StdResult<usize, Self::Error> {
        self.delegate.write(output)
    }

    fn shutdown(&mut self) -> StdResult<(), Self::Error> {
        self.delegate.shutdown()
    }
}
