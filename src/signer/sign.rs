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
    canonicalize::{self, BodyCanonicalizer},
    crypto::{self, CountingHasher, HashAlgorithm, SigningKey},
    header::{FieldName, HeaderField, HeaderFields},
    signature::{CanonicalizationAlgorithm, DKIM_SIGNATURE_NAME},
    signer::{
        config::{ConfigError, SignedHeaders, SigningConfig, MANDATORY_HEADERS},
        format::{self, UnsignedDkimSignature},
        SignerError, SigningResult,
    },
    util,
};
use tracing::{debug, trace};

/// Canonicalizes and hashes body content as it is fed in.
pub struct BodyHasher {
    canonicalizer: BodyCanonicalizer,
    hasher: CountingHasher,
}

impl BodyHasher {
    pub fn new(hash_alg: HashAlgorithm, canon_alg: CanonicalizationAlgorithm) -> Self {
        Self {
            canonicalizer: BodyCanonicalizer::new(canon_alg),
            hasher: CountingHasher::new(hash_alg),
        }
    }

    pub fn hash_chunk(&mut self, chunk: &[u8]) -> Result<(), SignerError> {
        let canonical = self.canonicalizer.canonicalize_chunk(chunk);
        self.hasher.update(&canonical).map_err(|_| SignerError::Overflow)
    }

    /// Returns the body hash and the length of the canonical body.
    pub fn finish(mut self) -> Result<(Box<[u8]>, u64), SignerError> {
        let canonical = self.canonicalizer.finish();
        self.hasher.update(&canonical).map_err(|_| SignerError::Overflow)?;
        Ok(self.hasher.finish())
    }
}

/// Selects the header fields to sign: every field whose name is in the set of
/// signed headers, in order of appearance. From, To, and Subject must all be
/// among them.
pub fn select_headers<'a>(
    headers: &'a HeaderFields,
    signed_headers: &SignedHeaders,
) -> Result<Vec<&'a HeaderField>, SignerError> {
    let mut pending: Vec<&str> = MANDATORY_HEADERS.to_vec();

    let selected: Vec<_> = headers
        .as_ref()
        .iter()
        .filter(|(name, _)| signed_headers.contains(name))
        .inspect(|(name, _)| pending.retain(|m| name != m))
        .collect();

    if !pending.is_empty() {
        let missing = pending
            .into_iter()
            .filter_map(|name| FieldName::new(name).ok())
            .collect();
        return Err(SignerError::MissingHeaders(missing));
    }

    Ok(selected)
}

/// Produces the canonical header block: each selected field, canonicalized
/// and terminated with CRLF.
pub fn canonicalize_selected_headers(
    canon_alg: CanonicalizationAlgorithm,
    selected: &[&HeaderField],
) -> Vec<u8> {
    let mut result = vec![];

    for (name, value) in selected {
        canonicalize::canonicalize_header(&mut result, canon_alg, name, value);
        result.extend(b"\r\n");
    }

    result
}

/// Assembles, signs, and formats the signature, given the selected headers and
/// the body hash results.
pub fn perform_signing(
    config: &SigningConfig,
    selected: &[&HeaderField],
    body_hash: Box<[u8]>,
    body_length: u64,
) -> Result<SigningResult, SignerError> {
    let algorithm = config.algorithm();
    let canonicalization = config.canonicalization();

    let signed_headers: Box<[FieldName]> = selected.iter().map(|(name, _)| name.clone()).collect();

    let copied_headers = config.z_param().then(|| {
        selected
            .iter()
            .map(|(name, value)| {
                let value: &[u8] = value.as_ref();
                (name.clone(), value.into())
            })
            .collect()
    });

    let body_length = config.length_param().then_some(body_length);

    let sig = UnsignedDkimSignature {
        algorithm,
        canonicalization,
        timestamp: config.timestamp().to_unix_secs(),
        selector: config.selector().clone(),
        domain: config.domain().clone(),
        identity: config.identity().cloned(),
        signed_headers,
        copied_headers,
        body_length,
        body_hash,
    };

    let skeleton = sig.format_without_signature();

    trace!("signature skeleton: {skeleton:?}");

    let mut signed_data = canonicalize_selected_headers(canonicalization.header, selected);
    canonicalize::canonicalize_header(
        &mut signed_data,
        canonicalization.header,
        DKIM_SIGNATURE_NAME,
        format!(" {skeleton}"),
    );

    let hash_alg = algorithm.hash_algorithm();
    let data_hash = crypto::digest(hash_alg, [&signed_data]);

    let signing_key = config.signing_key();
    if signing_key.key_type() != algorithm.key_type() {
        return Err(SignerError::Config(ConfigError::IncompatibleKeyType));
    }

    let signature_data = match signing_key {
        SigningKey::Rsa(k) => crypto::sign_rsa(hash_alg, k, &data_hash),
        SigningKey::Ed25519(k) => crypto::sign_ed25519(k, &data_hash),
    };

    let signature_data = signature_data.map_err(|e| {
        debug!("signing failed: {e}");
        SignerError::SigningFailure
    })?;

    let b = util::encode_base64(signature_data);

    // b= is on its own continuation line: tab, ‘b’, ‘=’
    let header_value = format!(" {skeleton}{}", format::fold_signature_data(&b, 3));

    debug!(
        domain = %sig.domain,
        selector = %sig.selector,
        headers = sig.signed_headers.len(),
        "created DKIM signature"
    );

    Ok(SigningResult {
        header_name: DKIM_SIGNATURE_NAME.into(),
        header_value,
        signed_headers: sig.signed_headers.into(),
        body_length,
    })
}
