// dkimsign – DKIM signature header generation
// Copyright © 2022–2023 David Bürgin <dbuergin@gluet.ch>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

use crate::{
    header::FieldName,
    quoted_printable,
    signature::{Canonicalization, DomainName, Identity, Selector, SignatureAlgorithm},
    util::{self, CanonicalStr},
};

// Note: Careful with offsets: formatting works with *characters*, not bytes!

/// The maximum line width used when folding the signature header.
pub const LINE_WIDTH: usize = 67;

const FOLD: &str = "\r\n\t";

/// DKIM signature data that does not yet have a cryptographic signature.
pub struct UnsignedDkimSignature {
    pub algorithm: SignatureAlgorithm,
    pub canonicalization: Canonicalization,
    pub timestamp: u64,
    pub selector: Selector,
    pub domain: DomainName,
    pub identity: Option<Identity>,
    pub signed_headers: Box<[FieldName]>,
    pub copied_headers: Option<Box<[(FieldName, Box<[u8]>)]>>,
    pub body_length: Option<u64>,
    pub body_hash: Box<[u8]>,
}

impl UnsignedDkimSignature {
    /// Returns the tags in output order, without the *b=* tag.
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = Vec::with_capacity(12);

        tags.push(("v", "1".into()));
        tags.push(("a", self.algorithm.canonical_str().into()));
        tags.push(("q", "dns/txt".into()));
        tags.push(("c", self.canonicalization.canonical_str().into()));
        tags.push(("t", self.timestamp.to_string()));
        tags.push(("s", self.selector.to_string()));
        tags.push(("d", self.domain.to_string()));

        if let Some(identity) = &self.identity {
            tags.push(("i", format_identity(identity)));
        }

        tags.push(("h", format_signed_headers(&self.signed_headers)));

        if let Some(copied_headers) = &self.copied_headers {
            tags.push(("z", format_copied_headers(copied_headers)));
        }

        if let Some(body_length) = self.body_length {
            tags.push(("l", body_length.to_string()));
        }

        tags.push(("bh", util::encode_base64(&self.body_hash)));

        tags
    }

    /// Returns the folded tag list ending in an empty *b=* tag.
    pub fn format_without_signature(&self) -> String {
        let fragments: Vec<_> = self
            .tags()
            .into_iter()
            .map(|(name, value)| format!("{name}={value};"))
            .collect();

        fold_fragments(&fragments)
    }
}

fn format_identity(identity: &Identity) -> String {
    quoted_printable::encode(identity.to_string().as_bytes(), false)
}

fn format_signed_headers(names: &[FieldName]) -> String {
    names
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(":")
}

fn format_copied_headers(headers: &[(FieldName, Box<[u8]>)]) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = quoted_printable::encode(trim_wsp(value), true);
            format!("{name}:{value}")
        })
        .collect::<Vec<_>>()
        .join("|")
}

fn trim_wsp(value: &[u8]) -> &[u8] {
    let is_space = |b: &u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let start = value.iter().position(|b| !is_space(b)).unwrap_or(value.len());
    let end = value.iter().rposition(|b| !is_space(b)).map_or(start, |i| i + 1);
    &value[start..end]
}

/// Joins `tag=value;` fragments with spaces, breaking the line before any
/// fragment that would overflow the line width. Fragments are never split.
/// The result ends with an empty *b=* tag on a continuation line.
pub fn fold_fragments<S: AsRef<str>>(fragments: &[S]) -> String {
    let mut out = String::new();
    let mut pos = 0;

    for fragment in fragments {
        let fragment = fragment.as_ref();
        let len = fragment.chars().count();

        if pos + len + 1 > LINE_WIDTH {
            out.push_str(FOLD);
            pos = len;
        } else {
            out.push(' ');
            pos += len + 1;
        }
        out.push_str(fragment);
    }

    out.push_str(FOLD);
    out.push_str("b=");

    out.trim_start().into()
}

/// Folds signature data into lines of at most [`LINE_WIDTH`] characters.
///
/// The first chunk of `LINE_WIDTH - offset` characters continues the current
/// line; each further chunk goes on a continuation line.
pub fn fold_signature_data(s: &str, offset: usize) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / LINE_WIDTH * FOLD.len());

    let (first_chunk, mut rest) = split_at_char(s, LINE_WIDTH.saturating_sub(offset));
    out.push_str(first_chunk);

    while !rest.is_empty() {
        let chunk;
        (chunk, rest) = split_at_char(rest, LINE_WIDTH);
        out.push_str(FOLD);
        out.push_str(chunk);
    }

    out
}

fn split_at_char(s: &str, n: usize) -> (&str, &str) {
    match s.char_indices().nth(n) {
        Some((i, _)) => s.split_at(i),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::CanonicalizationAlgorithm;

    fn copied(name: &str, value: &[u8]) -> (FieldName, Box<[u8]>) {
        (FieldName::new(name).unwrap(), value.into())
    }

    fn unsigned_signature() -> UnsignedDkimSignature {
        UnsignedDkimSignature {
            algorithm: SignatureAlgorithm::RsaSha256,
            canonicalization: Canonicalization::from((
                CanonicalizationAlgorithm::Relaxed,
                CanonicalizationAlgorithm::Simple,
            )),
            timestamp: 1700000000,
            selector: Selector::new("sel").unwrap(),
            domain: DomainName::new("example.com").unwrap(),
            identity: None,
            signed_headers: [
                FieldName::new("From").unwrap(),
                FieldName::new("To").unwrap(),
                FieldName::new("Subject").unwrap(),
            ]
            .into(),
            copied_headers: None,
            body_length: None,
            body_hash: vec![0; 32].into(),
        }
    }

    #[test]
    fn tags_in_order() {
        let mut sig = unsigned_signature();
        sig.identity = Some(Identity::new("joe@mail.example.com").unwrap());
        sig.body_length = Some(2);
        sig.copied_headers = Some(vec![copied("To", b" a|b ")].into());

        let names: Vec<_> = sig.tags().into_iter().map(|(n, _)| n).collect();

        assert_eq!(names, ["v", "a", "q", "c", "t", "s", "d", "i", "h", "z", "l", "bh"]);
    }

    #[test]
    fn format_without_signature_ok() {
        let sig = unsigned_signature();

        assert_eq!(
            sig.format_without_signature(),
            "v=1; a=rsa-sha256; q=dns/txt; c=relaxed/simple; t=1700000000;\r\n\
             \ts=sel; d=example.com; h=From:To:Subject;\r\n\
             \tbh=AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=;\r\n\
             \tb="
        );
    }

    #[test]
    fn format_identity_and_z() {
        let identity = Identity::new("@mail.example.com").unwrap();
        assert_eq!(format_identity(&identity), "@mail.example.com");

        let headers = [
            copied("From", b" Me <me@example.com> "),
            copied("Subject", b" a|b;\r\n\tc"),
        ];
        assert_eq!(
            format_copied_headers(&headers),
            "From:Me=20<me@example.com>|Subject:a=7Cb=3B=0D=0A=09c"
        );
    }

    #[test]
    fn fold_fragments_breaks_before_overflow() {
        let a = "a=".to_owned() + &"x".repeat(59) + ";";  // 62 chars, column 63

        let b = "b=y;";
        assert_eq!(fold_fragments(&[a.as_str(), b]), format!("{a}\r\n\t{b}\r\n\tb="));

        let b = "b=;";
        assert_eq!(fold_fragments(&[a.as_str(), b]), format!("{a} {b}\r\n\tb="));
    }

    #[test]
    fn fold_fragments_never_splits() {
        let long = "h=".to_owned() + &"X".repeat(100) + ";";

        assert_eq!(fold_fragments(&["v=1;", long.as_str()]), format!("v=1;\r\n\t{long}\r\n\tb="));
    }

    #[test]
    fn fold_signature_data_widths() {
        let s = "x".repeat(LINE_WIDTH);
        assert_eq!(fold_signature_data(&s, 0), s);

        let s = "x".repeat(LINE_WIDTH + 1);
        let folded = fold_signature_data(&s, 0);
        assert_eq!(folded.matches("\r\n\t").count(), 1);
        assert_eq!(folded, format!("{}\r\n\tx", "x".repeat(LINE_WIDTH)));

        assert_eq!(fold_signature_data("", 3), "");
    }

    #[test]
    fn fold_signature_data_offset() {
        let s = "a".repeat(64) + &"b".repeat(67) + "c";

        assert_eq!(
            fold_signature_data(&s, 3),
            format!("{}\r\n\t{}\r\n\tc", "a".repeat(64), "b".repeat(67))
        );

        // every chunk on a new line
        assert_eq!(fold_signature_data("abc", LINE_WIDTH), "\r\n\tabc");
        assert_eq!(fold_signature_data("abc", LINE_WIDTH + 5), "\r\n\tabc");
    }
}
