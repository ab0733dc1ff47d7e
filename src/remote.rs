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

//! A [`Sink`] that speaks RFC 3164 to a remote syslog daemon.

use crate::{
    config::{Protocol, SinkConfig},
    error::{Error, Result},
    output::Sink,
    rfc3164::{Rfc3164, Rfc3164Hostname},
    transport::{TcpTransport, Transport, UdpTransport},
};

use backtrace::Backtrace;
use chrono::prelude::*;
use tracing::{debug, info};

use std::collections::BTreeMap;

/// A log record: field name to value
pub type Record = BTreeMap<String, String>;

/// Everything we build during [`Sink::configure`]
struct Connection {
    formatter: Rfc3164,
    transport: Box<dyn Transport + Send + Sync>,
    message_key: String,
    target: String,
}

/// Forwards records to a remote syslog daemon over UDP or TCP.
///
/// Constructed unconfigured; [`Sink::configure`] resolves the local hostname, builds the
/// formatter & connects. Configuring again replaces the connection.
#[derive(Default)]
pub struct RemoteSyslogSink {
    conn: Option<Connection>,
}

impl RemoteSyslogSink {
    pub fn new() -> RemoteSyslogSink {
        RemoteSyslogSink::default()
    }
    pub fn is_configured(&self) -> bool {
        self.conn.is_some()
    }
    fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| Error::NotConfigured {
            back: Backtrace::new(),
        })
    }
}

impl Sink for RemoteSyslogSink {
    type Config = SinkConfig;
    type Record = Record;
    type Output = Vec<u8>;
    type Error = Error;

    fn configure(&mut self, config: &SinkConfig) -> Result<()> {
        let hostname = match config.hostname() {
            Some(hostname) => Rfc3164Hostname::try_from(hostname.to_owned())?,
            None => Rfc3164Hostname::try_default()?,
        };
        let addr = (config.host(), config.port());
        let transport: Box<dyn Transport + Send + Sync> = match config.protocol() {
            Protocol::Udp => Box::new(UdpTransport::new(addr)?),
            Protocol::Tcp => Box::new(TcpTransport::new(addr)?),
        };

        // Replacing an existing connection; a failure to close the old one is no reason to
        // refuse the new one.
        if let Some(old) = self.conn.take() {
            if let Err(err) = old.transport.shutdown() {
                debug!("while closing connection to {}, got {}", old.target, err);
            }
        }

        info!(
            "remote syslog sink connected: target={} protocol={}",
            config.target(),
            config.protocol()
        );
        self.conn = Some(Connection {
            formatter: Rfc3164::new(config.facility(), config.severity(), hostname),
            transport,
            message_key: config.message_key().to_owned(),
            target: config.target(),
        });
        Ok(())
    }

    fn format(&self, tag: &str, time: DateTime<Utc>, record: &Record) -> Result<Vec<u8>> {
        let conn = self.connection()?;
        let msg = record
            .get(&conn.message_key)
            .ok_or_else(|| Error::NoMessageField {
                key: conn.message_key.clone(),
                back: Backtrace::new(),
            })?;
        conn.formatter.format(tag, msg, time)
    }

    fn write(&self, output: &Vec<u8>) -> Result<usize> {
        self.connection()?.transport.send(output)
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.transport.shutdown()?;
            debug!("remote syslog sink disconnected from {}", conn.target);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{facility::Facility, output::TruncatingOutput};

    use std::io::{BufRead, BufReader};
    use std::net::{TcpListener, UdpSocket};

    fn record(msg: &str) -> Record {
        let mut r = Record::new();
        r.insert("message".to_owned(), msg.to_owned());
        r.insert("stream".to_owned(), "stdout".to_owned());
        r
    }

    fn timestamp(time: DateTime<Utc>) -> String {
        time.with_timezone(&Local).format("%b %e %H:%M:%S").to_string()
    }

    #[test]
    fn unconfigured() {
        let mut sink = RemoteSyslogSink::new();
        assert!(!sink.is_configured());
        assert!(matches!(
            sink.format("tag", Utc::now(), &record("hi")),
            Err(Error::NotConfigured { .. })
        ));
        assert!(matches!(
            sink.write(&b"hi".to_vec()),
            Err(Error::NotConfigured { .. })
        ));
        // shutting down an unconfigured sink is harmless
        assert!(sink.shutdown().is_ok());
    }

    #[test]
    fn udp_through_wrapper() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = server.local_addr().unwrap().port();

        let mut output: TruncatingOutput<RemoteSyslogSink> = TruncatingOutput::new();
        output
            .configure(
                &SinkConfig::builder("127.0.0.1")
                    .port(port)
                    .hostname("bree")
                    .facility(Facility::LOG_LOCAL0)
                    .build(),
            )
            .unwrap();
        assert!(output.delegate().is_configured());

        let time: DateTime<Utc> = std::time::UNIX_EPOCH.into();
        let packet = output
            .format(
                "kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar",
                time,
                &record("Hello, 世界!"),
            )
            .unwrap();
        assert_eq!(output.write(&packet).unwrap(), packet.len());

        let mut buf = [0u8; 1024];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(
            std::str::from_utf8(&buf[..n]).unwrap(),
            format!(
                "<133>{} bree kube-system.verylongpodn*.sideca: Hello, 世界!",
                timestamp(time)
            )
        );

        output.shutdown().unwrap();
        assert!(!output.delegate().is_configured());
    }

    #[test]
    fn tcp_through_wrapper() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut output: TruncatingOutput<RemoteSyslogSink> = TruncatingOutput::new();
        output
            .configure(
                &SinkConfig::builder("127.0.0.1")
                    .port(port)
                    .protocol(Protocol::Tcp)
                    .hostname("bree")
                    .build(),
            )
            .unwrap();
        let (stream, _) = listener.accept().unwrap();

        let time: DateTime<Utc> = std::time::UNIX_EPOCH.into();
        for tag in ["kube.default.webapp.nginx", "kube.onlytwoparts"] {
            let packet = output.format(tag, time, &record("ping")).unwrap();
            output.write(&packet).unwrap();
        }
        output.shutdown().unwrap();

        let lines: Vec<String> = BufReader::new(stream).lines().map(|l| l.unwrap()).collect();
        assert_eq!(
            lines,
            vec![
                format!("<13>{} bree default.webapp.nginx: ping", timestamp(time)),
                format!("<13>{} bree kube.onlytwoparts: ping", timestamp(time)),
            ]
        );
    }

    #[test]
    fn message_key() {
        let mut sink = RemoteSyslogSink::new();
        sink.configure(
            &SinkConfig::builder("127.0.0.1")
                .hostname("bree")
                .message_key("log")
                .build(),
        )
        .unwrap();

        let err = sink.format("app", Utc::now(), &record("hi")).unwrap_err();
        assert!(matches!(err, Error::NoMessageField { .. }));

        let mut r = Record::new();
        r.insert("log".to_owned(), "from the log field".to_owned());
        let packet = sink.format("app", Utc::now(), &r).unwrap();
        assert!(std::str::from_utf8(&packet)
            .unwrap()
            .ends_with(" bree app: from the log field"));
    }

    #[test]
    fn reconfigure() {
        let first = UdpSocket::bind("127.0.0.1:0").unwrap();
        let second = UdpSocket::bind("127.0.0.1:0").unwrap();

        let mut sink = RemoteSyslogSink::new();
        for server in [&first, &second] {
            sink.configure(
                &SinkConfig::builder("127.0.0.1")
                    .port(server.local_addr().unwrap().port())
                    .hostname("bree")
                    .build(),
            )
            .unwrap();
            let packet = sink.format("app", Utc::now(), &record("hi")).unwrap();
            sink.write(&packet).unwrap();
        }

        let mut buf = [0u8; 256];
        assert!(first.recv(&mut buf).unwrap() > 0);
        assert!(second.recv(&mut buf).unwrap() > 0);
    }

    #[test]
    fn bad_hostname() {
        let mut sink = RemoteSyslogSink::new();
        assert!(sink
            .configure(&SinkConfig::builder("127.0.0.1").hostname("has a space").build())
            .is_err());
        assert!(!sink.is_configured());
    }

    #[test]
    #[cfg(feature = "rsyslogd")]
    fn test_remote_syslog_via_udp() {
        let mut output: TruncatingOutput<RemoteSyslogSink> = TruncatingOutput::new();
        output
            .configure(&SinkConfig::builder("127.0.0.1").build())
            .unwrap();
        for tag in [
            "kube.default.webapp.nginx",
            "kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar",
            "kube.onlytwoparts",
        ] {
            let packet = output.format(tag, Utc::now(), &record("Hello, 世界!")).unwrap();
            output.write(&packet).unwrap();
        }
        output.shutdown().unwrap();
    }
}
