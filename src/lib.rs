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

//! A library for creating *DomainKeys Identified Mail* (DKIM) signature
//! headers as described in [RFC 6376].
//!
//! Given a message’s header fields and body, a [`Signer`] canonicalizes the
//! content, selects the headers to sign, and produces a folded
//! `DKIM-Signature` header ready to be prepended to the message. Signing is
//! configured through [`SigningConfig`]: signing domain, selector, private
//! key, algorithm, canonicalization, and the set of headers eligible for
//! signing.
//!
//! Independently of signing, [`check_public_key`] looks up the public key
//! record for a domain and selector in DNS, so that a deployment can check
//! that its key is published.
//!
//! The lower-level building blocks (canonicalization, quoted-printable
//! encoding, key record parsing, cryptography) are available in their own
//! modules.
//!
//! # Cargo features
//!
//! The feature **`hickory-resolver`** makes an implementation of
//! [`LookupTxt`][crate::lookup::LookupTxt] available for the Hickory DNS
//! resolver.
//!
//! The feature **`pre-rfc8301`** enables dependency `sha1` and thereby the
//! insecure, historic *rsa-sha1* signature algorithm. This is a legacy
//! compatibility feature, its use is strongly discouraged.
//!
//! [RFC 6376]: https://www.rfc-editor.org/rfc/rfc6376

pub mod canonicalize;
pub mod crypto;
pub mod header;
pub mod lookup;
mod parse;
pub mod quoted_printable;
pub mod record;
pub mod signature;
pub mod signer;
mod tag_list;
mod util;

pub use crate::{
    crypto::SigningKey,
    header::{FieldBody, FieldName, HeaderField, HeaderFields},
    lookup::{check_public_key, LookupError, LookupTxt},
    signature::{
        Canonicalization, CanonicalizationAlgorithm, DomainName, Identity, Selector,
        SignatureAlgorithm,
    },
    signer::{
        ConfigError, SignedHeaders, Signer, SignerError, SigningConfig, SigningResult, Timestamp,
    },
    util::{decode_base64, encode_base64, Base64Error, CanonicalStr},
};
