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

//! Send container-platform tags through the truncating output to port 514 on the local host, via UDP.

use tracing::info;
use truncating_remote_syslog::{
    config::SinkConfig,
    output::{Sink, TruncatingOutput},
    remote::{Record, RemoteSyslogSink},
};

const TAGS: [&str; 5] = [
    "kube.default.webapp.nginx",
    "kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar",
    "kube.a-namespace-whose-name-goes-on-and-on.web-5d8f7c9b6-x2x9q.app",
    "kube.onlytwoparts",
    "fluent.info",
];

pub fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut output: TruncatingOutput<RemoteSyslogSink> = TruncatingOutput::new();
    output
        .configure(&SinkConfig::from_params([("host", "127.0.0.1"), ("protocol", "udp")]).unwrap())
        .unwrap();

    for tag in TAGS {
        let mut record = Record::new();
        record.insert("message".to_owned(), format!("你好, UDP socket, from {}.", tag));
        let packet = output.format(tag, chrono::Utc::now(), &record).unwrap();
        let sent = output.write(&packet).unwrap();
        info!("sent {} bytes for {}", sent, tag);
    }

    output.shutdown().unwrap();
}
