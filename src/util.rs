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

use base64ct::{Base64, Encoding};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str,
};

/// A trait for entities that have a canonical string representation in DKIM.
pub trait CanonicalStr {
    /// Returns the canonical string representation.
    fn canonical_str(&self) -> &'static str;
}

/// Encodes binary data as a Base64 string, without line breaks.
pub fn encode_base64(input: impl AsRef<[u8]>) -> String {
    Base64::encode_string(input.as_ref())
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Base64Error;

impl Display for Base64Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode Base64 data")
    }
}

impl Error for Base64Error {}

/// Decodes a Base64 string.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, Base64Error> {
    Base64::decode_vec(input).map_err(|_| Base64Error)
}

/// Returns the longest prefix of `bytes` that is well-formed UTF-8, or `None`
/// if `bytes` starts with an ill-formed sequence.
pub fn next_utf8_chunk(bytes: &[u8]) -> Option<&str> {
    match str::from_utf8(bytes) {
        Ok(s) => Some(s),
        Err(e) => {
            let valid = e.valid_up_to();
            if valid == 0 {
                None
            } else {
                // valid_up_to guarantees well-formedness of the prefix
                str::from_utf8(&bytes[..valid]).ok()
            }
        }
    }
}
