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

//! DKIM-Quoted-Printable encoding.
//!
//! See RFC 6376, section 2.11.

use crate::{parse::is_wsp, util};
use std::{
    error::Error,
    fmt::{self, Display, Formatter, Write},
};

/// Encodes bytes as a DKIM-Quoted-Printable string.
///
/// With `encode_bar`, the vertical bar is encoded as well, as required for
/// the entries of the *z=* tag.
pub fn encode(mut bytes: &[u8], encode_bar: bool) -> String {
    fn encode_byte(s: &mut String, b: u8) {
        let _ = write!(s, "={b:02X}");
    }

    let mut result = String::with_capacity(bytes.len());

    while !bytes.is_empty() {
        if let Some(chunk) = util::next_utf8_chunk(bytes) {
            for c in chunk.chars() {
                // All non-ASCII characters are safe; unsafe characters are
                // therefore always single bytes.
                if is_dkim_safe_char(c) && !(c == '|' && encode_bar) {
                    result.push(c);
                } else {
                    let mut buf = [0; 4];
                    for b in c.encode_utf8(&mut buf).bytes() {
                        encode_byte(&mut result, b);
                    }
                }
            }
            bytes = &bytes[chunk.len()..];
        } else {
            encode_byte(&mut result, bytes[0]);
            bytes = &bytes[1..];
        }
    }

    result
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct QuotedPrintableError;

impl Display for QuotedPrintableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode Quoted-Printable data")
    }
}

impl Error for QuotedPrintableError {}

// This is slightly modified from RFC 2045, section 6.7: It uses RFC 6376’s
// *dkim-safe-char*, also allowing UTF-8 content.

/// Decodes the bytes in an RFC 2045 *qp-section*, as used in the *n=* tag of
/// a key record.
pub fn decode_qp_section(s: &str) -> Result<Vec<u8>, QuotedPrintableError> {
    let mut result = Vec::with_capacity(s.len());

    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '=' {
            let d1 = chars.next().and_then(hex_value).ok_or(QuotedPrintableError)?;
            let d2 = chars.next().and_then(hex_value).ok_or(QuotedPrintableError)?;
            result.push(d1 * 0x10 + d2);
        } else if is_dkim_safe_char(c) || is_wsp(c) {
            let mut buf = [0; 4];
            result.extend(c.encode_utf8(&mut buf).bytes());
        } else {
            return Err(QuotedPrintableError);
        }
    }

    Ok(result)
}

// Strictly speaking, only uppercase hex digits are allowed in (DKIM-)
// Quoted-Printable, but there is no harm in accepting lowercase, too.
fn hex_value(c: char) -> Option<u8> {
    c.to_digit(16).and_then(|d| u8::try_from(d).ok())
}

fn is_dkim_safe_char(c: char) -> bool {
    // printable ASCII without ; and = plus any non-ASCII UTF-8
    matches!(c, '!'..=':' | '<' | '>'..='~') || !c.is_ascii()
}
