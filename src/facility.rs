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

//! syslog facility & severity definitions.
//!
//! [`Facility`] and [`Level`] use the names from `<syslog.h>`. Both parse from the short,
//! lower-case names collector configurations tend to use (`user`, `local3`, `notice`, `warn`)
//! as well as from the `<syslog.h>` spelling (`LOG_USER`), case-insensitively.

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// Strip an optional, case-insensitive `LOG_` prefix & lower-case what's left
fn normalize(s: &str) -> String {
    let lower = s.trim().to_ascii_lowercase();
    match lower.strip_prefix("log_") {
        Some(rest) => rest.to_owned(),
        None => lower,
    }
}

/// The twenty-four syslog facilities.
///
/// Discriminants are the `<syslog.h>` values, already shifted left by three so that a facility
/// can be or-ed directly with a [`Level`] to produce a PRI value.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Facility {
    /// kernel messages
    LOG_KERN = 0 << 3,
    /// user-level messages
    LOG_USER = 1 << 3,
    /// mail system
    LOG_MAIL = 2 << 3,
    /// system daemons
    LOG_DAEMON = 3 << 3,
    /// security/authorization messages
    LOG_AUTH = 4 << 3,
    /// messages generated internally by syslogd
    LOG_SYSLOG = 5 << 3,
    /// line printer subsystem
    LOG_LPR = 6 << 3,
    /// network news subsystem
    LOG_NEWS = 7 << 3,
    /// UUCP subsystem
    LOG_UUCP = 8 << 3,
    /// clock daemon
    LOG_CRON = 9 << 3,
    /// security/authorization messages (private)
    LOG_AUTHPRIV = 10 << 3,
    /// ftp daemon
    LOG_FTP = 11 << 3,
    /// NTP subsystem
    LOG_NTP = 12 << 3,
    /// log audit
    LOG_AUDIT = 13 << 3,
    /// log alert
    LOG_ALERT = 14 << 3,
    /// clock daemon (the other one)
    LOG_CLOCK = 15 << 3,
    LOG_LOCAL0 = 16 << 3,
    LOG_LOCAL1 = 17 << 3,
    LOG_LOCAL2 = 18 << 3,
    LOG_LOCAL3 = 19 << 3,
    LOG_LOCAL4 = 20 << 3,
    LOG_LOCAL5 = 21 << 3,
    LOG_LOCAL6 = 22 << 3,
    LOG_LOCAL7 = 23 << 3,
}

impl std::default::Default for Facility {
    /// The default facility is `LOG_USER`.
    fn default() -> Self {
        Facility::LOG_USER
    }
}

const FACILITIES: [(&str, Facility); 24] = [
    ("kern", Facility::LOG_KERN),
    ("user", Facility::LOG_USER),
    ("mail", Facility::LOG_MAIL),
    ("daemon", Facility::LOG_DAEMON),
    ("auth", Facility::LOG_AUTH),
    ("syslog", Facility::LOG_SYSLOG),
    ("lpr", Facility::LOG_LPR),
    ("news", Facility::LOG_NEWS),
    ("uucp", Facility::LOG_UUCP),
    ("cron", Facility::LOG_CRON),
    ("authpriv", Facility::LOG_AUTHPRIV),
    ("ftp", Facility::LOG_FTP),
    ("ntp", Facility::LOG_NTP),
    ("audit", Facility::LOG_AUDIT),
    ("alert", Facility::LOG_ALERT),
    ("clock", Facility::LOG_CLOCK),
    ("local0", Facility::LOG_LOCAL0),
    ("local1", Facility::LOG_LOCAL1),
    ("local2", Facility::LOG_LOCAL2),
    ("local3", Facility::LOG_LOCAL3),
    ("local4", Facility::LOG_LOCAL4),
    ("local5", Facility::LOG_LOCAL5),
    ("local6", Facility::LOG_LOCAL6),
    ("local7", Facility::LOG_LOCAL7),
];

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        // `FACILITIES` is exhaustive, so the fallback is never taken.
        let name = FACILITIES
            .iter()
            .find(|(_, fac)| fac == self)
            .map(|(name, _)| *name)
            .unwrap_or("?");
        write!(f, "LOG_{}", name.to_ascii_uppercase())
    }
}

impl std::str::FromStr for Facility {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        let name = normalize(s);
        FACILITIES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, fac)| *fac)
            .ok_or_else(|| Error::BadConfig {
                key: "facility".to_owned(),
                value: s.to_owned(),
                back: Backtrace::new(),
            })
    }
}

/// The eight syslog severities, as defined by `<syslog.h>`.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be taken immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl std::default::Default for Level {
    /// The default severity is `LOG_NOTICE`.
    fn default() -> Self {
        Level::LOG_NOTICE
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(
            f,
            "{}",
            match self {
                Level::LOG_EMERG => "LOG_EMERG",
                Level::LOG_ALERT => "LOG_ALERT",
                Level::LOG_CRIT => "LOG_CRIT",
                Level::LOG_ERR => "LOG_ERR",
                Level::LOG_WARNING => "LOG_WARNING",
                Level::LOG_NOTICE => "LOG_NOTICE",
                Level::LOG_INFO => "LOG_INFO",
                Level::LOG_DEBUG => "LOG_DEBUG",
            }
        )
    }
}

impl std::str::FromStr for Level {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match normalize(s).as_str() {
            "emerg" | "panic" => Ok(Level::LOG_EMERG),
            "alert" => Ok(Level::LOG_ALERT),
            "crit" => Ok(Level::LOG_CRIT),
            "err" | "error" => Ok(Level::LOG_ERR),
            "warning" | "warn" => Ok(Level::LOG_WARNING),
            "notice" => Ok(Level::LOG_NOTICE),
            "info" => Ok(Level::LOG_INFO),
            "debug" => Ok(Level::LOG_DEBUG),
            _ => Err(Error::BadConfig {
                key: "severity".to_owned(),
                value: s.to_owned(),
                back: Backtrace::new(),
            }),
        }
    }
}

#[cfg(test)]
mod facility_level_tests {
    use super::*;

    #[test]
    fn test_pri() {
        assert_eq!(14, (Facility::LOG_USER as u8) | (Level::LOG_INFO as u8));
        assert_eq!(13, (Facility::LOG_USER as u8) | (Level::default() as u8));
        assert_eq!(format!("{}", Facility::LOG_FTP), "LOG_FTP".to_string());
        assert_eq!(format!("{}", Facility::LOG_LOCAL7), "LOG_LOCAL7".to_string());
    }

    #[test]
    fn test_parse() {
        assert_eq!("user".parse::<Facility>().unwrap(), Facility::LOG_USER);
        assert_eq!("LOG_LOCAL3".parse::<Facility>().unwrap(), Facility::LOG_LOCAL3);
        assert_eq!(" Daemon ".parse::<Facility>().unwrap(), Facility::LOG_DAEMON);
        assert!("local8".parse::<Facility>().is_err());

        assert_eq!("notice".parse::<Level>().unwrap(), Level::LOG_NOTICE);
        assert_eq!("warn".parse::<Level>().unwrap(), Level::LOG_WARNING);
        assert_eq!("LOG_ERR".parse::<Level>().unwrap(), Level::LOG_ERR);
        assert_eq!("error".parse::<Level>().unwrap(), Level::LOG_ERR);
        let err = "loud".parse::<Level>().unwrap_err();
        assert_eq!(format!("{}", err), "\"loud\" is not a valid value for severity");
    }
}
