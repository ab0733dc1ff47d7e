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

//! Tag compaction
//! ==============
//!
//! # Introduction
//!
//! RFC [3164] says of the TAG field that it "MUST NOT exceed 32 characters". Container platforms
//! don't much care: a log collector will hand us routing tags of the form
//! `kube.<namespace>.<pod>.<container>`, and generated pod names alone routinely blow through
//! that limit.
//!
//! [3164]: https://datatracker.ietf.org/doc/html/rfc3164
//!
//! [`compact`] shrinks a tag to at most [`MAX_TAG_LEN`] characters while holding onto as much of
//! the namespace, pod & container as it can. The decision tree, first match wins:
//!
//! 0. tags that don't start with `kube.` are simply cut to the first 32 characters
//! 1. structured tags are split into namespace, pod & container
//! 2. if `namespace.pod.container` fits, that's the answer
//! 3. if the pod name is too short to absorb the overage, the joined string is cut to 31
//!    characters & a `*` marker appended
//! 4. otherwise the tail of the pod name is removed, a `*` marks the cut, and the result is cut
//!    to 32 characters should it still be too long
//!
//! Tier 4 keeps `len(pod) - overhead` characters of the pod, so the marker always leaves the
//! reassembled tag one character over the limit: the final cut to 32 applies to every tier-4
//! result & costs the container its last character (`kube-system.verylongpodn*.sideca`).
//!
//! "Characters" here are `char`s, not bytes; every cut lands on a `char` boundary.
//!
//! # Examples
//!
//! ```rust
//! use truncating_remote_syslog::tag::compact;
//! assert_eq!(compact("kube.default.webapp.nginx"), "default.webapp.nginx");
//! assert_eq!(compact("not-a-kube-tag"), "not-a-kube-tag");
//! ```

use backtrace::Backtrace;

/// The longest tag (in `char`s) RFC 3164 will let us put in the TAG field
pub const MAX_TAG_LEN: usize = 32;

/// Inserted wherever a tag was shortened
pub const MARKER: char = '*';

/// Tags beginning with this prefix are expected to be `kube.<namespace>.<pod>.<container>`
pub const KUBE_PREFIX: &str = "kube.";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// tag compaction errors
#[non_exhaustive]
pub enum Error {
    /// A tag began with `kube.` but didn't carry namespace, pod & container fields
    MalformedTag { tag: String, back: Backtrace },
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MalformedTag { tag, .. } => write!(
                f,
                "{:?} begins with {:?} but lacks namespace, pod & container fields",
                tag, KUBE_PREFIX
            ),
            _ => write!(f, "tag compaction error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MalformedTag { tag: _, back } => {
                // captured unresolved; only pay for symbols when someone looks
                let mut back = back.clone();
                back.resolve();
                write!(f, "{}\n{:#?}", self, back)
            }
            _ => write!(f, "{}", self),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        utility functions                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The first `n` `char`s of `s` (or all of `s`, if it's shorter)
fn head(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          parsed tags                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A tag of the form `kube.<namespace>.<pod>.<container>`, borrowing from the tag it was parsed from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StructuredTag<'a> {
    pub namespace: &'a str,
    pub pod: &'a str,
    pub container: &'a str,
}

/// The result of a successful [`parse`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsedTag<'a> {
    /// Not a container-platform tag; we know nothing about its structure
    Plain(&'a str),
    Structured(StructuredTag<'a>),
}

/// Classify `tag`, answering `None` for a tag that begins with `kube.` but lacks namespace, pod &
/// container fields.
///
/// Trailing empty fields are not counted: `kube.ns.pod.` has no container & is malformed, while
/// `kube.ns..container` has an empty pod name & is fine. Anything past the container field is
/// ignored. No error is built here, so callers that just want to fall back pay nothing for it.
pub fn classify(tag: &str) -> Option<ParsedTag<'_>> {
    let rest = match tag.strip_prefix(KUBE_PREFIX) {
        Some(rest) => rest,
        None => return Some(ParsedTag::Plain(tag)),
    };

    let mut fields = rest.trim_end_matches('.').split('.');
    match (fields.next(), fields.next(), fields.next()) {
        (Some(namespace), Some(pod), Some(container)) => Some(ParsedTag::Structured(StructuredTag {
            namespace,
            pod,
            container,
        })),
        _ => None,
    }
}

/// Classify `tag`, failing on a malformed structured tag (see [`classify`])
pub fn parse(tag: &str) -> Result<ParsedTag<'_>> {
    classify(tag).ok_or_else(|| Error::MalformedTag {
        tag: tag.to_owned(),
        back: Backtrace::new_unresolved(),
    })
}

impl<'a> ParsedTag<'a> {
    /// Shorten this tag to [`MAX_TAG_LEN`] characters
    pub fn compact(&self) -> String {
        match self {
            ParsedTag::Plain(tag) => truncate(tag),
            ParsedTag::Structured(st) => st.compact(),
        }
    }
}

impl<'a> StructuredTag<'a> {
    /// Join namespace, pod & container, shortening the result to [`MAX_TAG_LEN`] characters
    pub fn compact(&self) -> String {
        let total = char_len(self.namespace) + char_len(self.pod) + char_len(self.container);
        let joined = format!("{}.{}.{}", self.namespace, self.pod, self.container);
        // `+ 2` for the two dots
        if total + 2 <= MAX_TAG_LEN {
            return joined;
        }

        // The number of characters we need to lose; strictly positive at this point.
        let overhead = total + 2 - MAX_TAG_LEN;
        let pod_len = char_len(self.pod);
        if pod_len <= overhead {
            let mut t = head(&joined, MAX_TAG_LEN - 1).to_owned();
            t.push(MARKER);
            return t;
        }

        let t = format!(
            "{}.{}{}.{}",
            self.namespace,
            head(self.pod, pod_len - overhead),
            MARKER,
            self.container
        );
        if char_len(&t) > MAX_TAG_LEN {
            head(&t, MAX_TAG_LEN).to_owned()
        } else {
            t
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         the entry points                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Cut `tag` to its first [`MAX_TAG_LEN`] characters
pub fn truncate(tag: &str) -> String {
    head(tag, MAX_TAG_LEN).to_owned()
}

/// Compact `tag`, failing if it claims to be a structured tag but isn't
pub fn try_compact(tag: &str) -> Result<String> {
    Ok(parse(tag)?.compact())
}

/// Compact `tag` to at most [`MAX_TAG_LEN`] characters.
///
/// Never fails; a malformed structured tag is handled just like any other tag not of the form
/// `kube.<namespace>.<pod>.<container>`.
pub fn compact(tag: &str) -> String {
    match classify(tag) {
        Some(parsed) => parsed.compact(),
        None => truncate(tag),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    fn kube(ns: &str, pod: &str, container: &str) -> String {
        format!("kube.{}.{}.{}", ns, pod, container)
    }

    #[test]
    fn plain_tags() {
        assert_eq!(compact("abc"), "abc");
        assert_eq!(compact(""), "");
        assert_eq!(
            compact("fluent.info.this.is.a.really.long.plain.tag"),
            "fluent.info.this.is.a.really.lon"
        );
        // case matters
        assert_eq!(compact("KUBE.a.b.c"), "KUBE.a.b.c");
        // no trailing dot, no dice
        assert_eq!(compact("kube"), "kube");
    }

    #[test]
    fn exact_fit() {
        assert_eq!(
            compact("kube.default.webapp.nginx"),
            "default.webapp.nginx"
        );
        // total + 2 == 32
        let ns = "a".repeat(10);
        let pod = "b".repeat(10);
        let container = "c".repeat(10);
        let t = compact(&kube(&ns, &pod, &container));
        assert_eq!(t, format!("{}.{}.{}", ns, pod, container));
        assert_eq!(t.len(), 32);
        // extra fields are dropped
        assert_eq!(compact("kube.ns.pod.container.extra"), "ns.pod.container");
    }

    #[test]
    fn one_over() {
        // total + 2 == 33: overhead is one, the pod loses one character, the marker pushes us
        // back to 33 & the final cut takes the last character of the container
        let ns = "a".repeat(10);
        let pod = "b".repeat(10);
        let container = "c".repeat(11);
        let t = compact(&kube(&ns, &pod, &container));
        assert_eq!(t, format!("{}.{}*.{}", ns, "b".repeat(9), "c".repeat(10)));
        assert_eq!(t.chars().count(), 32);
    }

    #[test]
    fn pod_truncation() {
        let t = compact("kube.kube-system.verylongpodnamegeneratedbyoperator.sidecar");
        assert_eq!(t, "kube-system.verylongpodn*.sideca");
        assert_eq!(t.len(), 32);
        assert!(t.starts_with("kube-system.verylongpod"));

        // len(pod) == overhead + 1: a single character of the pod survives
        let ns = "n".repeat(20);
        let container = "c".repeat(9);
        let t = compact(&kube(&ns, "pppppp", &container));
        assert_eq!(t, format!("{}.p*.{}", ns, "c".repeat(8)));
    }

    #[test]
    fn short_pod() {
        // len(pod) == overhead
        let ns = "n".repeat(20);
        let container = "c".repeat(10);
        let t = compact(&kube(&ns, "ppppp", &container));
        assert_eq!(t, format!("{}.ppppp.cccc*", ns));
        assert_eq!(t.len(), 32);

        // len(pod) < overhead; the cut lands in the namespace
        let ns = "n".repeat(40);
        let t = compact(&kube(&ns, "p", "c"));
        assert_eq!(t, format!("{}*", "n".repeat(31)));
    }

    #[test]
    fn long_namespace() {
        let ns = "a-namespace-whose-name-goes-on-and-on";
        let pod = "web-5d8f7c9b6-x2x9q";
        let t = compact(&kube(ns, pod, "app"));
        // the pod is shorter than the overage, so we're down to a hard cut
        assert_eq!(t, "a-namespace-whose-name-goes-on-*");
    }

    #[test]
    fn malformed() {
        assert!(try_compact("kube.onlytwoparts").is_err());
        assert!(try_compact("kube.ns.pod").is_err());
        assert!(try_compact("kube.ns.pod.").is_err());
        assert!(try_compact("kube.").is_err());
        assert_eq!(compact("kube.onlytwoparts"), "kube.onlytwoparts");
        assert_eq!(
            compact("kube.a-namespace.with-a-long-pod-name-but-no-container"),
            "kube.a-namespace.with-a-long-pod"
        );

        // interior empty fields are fine
        assert_eq!(compact("kube.ns..c"), "ns..c");
        assert_eq!(compact("kube.ns.pod..x"), "ns.pod.");
    }

    #[test]
    fn parsing() {
        assert_eq!(parse("syslog").unwrap(), ParsedTag::Plain("syslog"));
        assert_eq!(
            parse("kube.default.webapp.nginx").unwrap(),
            ParsedTag::Structured(StructuredTag {
                namespace: "default",
                pod: "webapp",
                container: "nginx"
            })
        );
        assert_eq!(classify("kube.onlytwoparts"), None);
        assert_eq!(
            classify("kube.a.b.c"),
            Some(ParsedTag::Structured(StructuredTag {
                namespace: "a",
                pod: "b",
                container: "c"
            }))
        );
        let err = parse("kube.onlytwoparts").unwrap_err();
        assert!(format!("{}", err).contains("kube.onlytwoparts"));
        // Debug resolves the backtrace on demand
        assert!(format!("{:?}", err).contains("kube.onlytwoparts"));
    }

    #[test]
    fn malformed_errors_are_cheap() {
        // the backtrace is captured but not symbolized until someone asks
        match parse("kube.onlytwoparts") {
            Err(Error::MalformedTag { back, .. }) => {
                assert!(back.frames().iter().all(|frame| frame.symbols().is_empty()))
            }
            other => panic!("expected MalformedTag, got {:?}", other),
        }
    }

    #[test]
    fn many_malformed_tags() {
        // a stream of short structured tags goes through the fallback without building errors
        let tags: Vec<String> = (0..10_000).map(|i| format!("kube.ns-{}", i)).collect();
        for tag in &tags {
            assert_eq!(compact(tag), truncate(tag));
        }
        assert!(tags.iter().all(|tag| classify(tag).is_none()));
    }

    #[test]
    fn multibyte() {
        // 40 two-byte characters; the cut must count characters, not bytes
        let tag = "é".repeat(40);
        let t = compact(&tag);
        assert_eq!(t.chars().count(), 32);
        assert_eq!(t, "é".repeat(32));

        let t = compact(&kube(&"名".repeat(12), &"字".repeat(12), &"空".repeat(12)));
        assert_eq!(t.chars().count(), 32);
        assert!(t.starts_with(&"名".repeat(12)));
        assert!(t.contains("*."));
    }

    #[test]
    fn length_and_determinism() {
        let segments = [
            "",
            "a",
            "kube",
            "kube-system",
            "verylongpodnamegeneratedbyoperator",
            "web-5d8f7c9b6-x2x9q",
            "名前空間",
            "a-very-long-segment-indeed-it-keeps-going-and-going",
        ];
        for ns in &segments {
            for pod in &segments {
                for container in &segments {
                    for tag in [
                        kube(ns, pod, container),
                        format!("kube.{}.{}", ns, pod),
                        format!("{}.{}.{}", ns, pod, container),
                    ] {
                        let t = compact(&tag);
                        assert!(t.chars().count() <= MAX_TAG_LEN, "{:?} -> {:?}", tag, t);
                        assert_eq!(t, compact(&tag));
                    }
                }
            }
        }
    }
}
