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

use crate::crypto::{SigningError, VerificationError};
use ed25519_dalek::{pkcs8::DecodePublicKey, Signer, SigningKey, VerifyingKey};

pub fn read_ed25519_verifying_key(key_data: &[u8]) -> Result<VerifyingKey, VerificationError> {
    // raw key bytes first, then SubjectPublicKeyInfo
    VerifyingKey::try_from(key_data)
        .or_else(|_| VerifyingKey::from_public_key_der(key_data))
        .map_err(|_| VerificationError::InvalidKey)
}

/// Signs the given digest (RFC 8463: the Ed25519 input is the SHA-256 hash of
/// the signed data, not the data itself).
pub fn sign_ed25519(signing_key: &SigningKey, data_hash: &[u8]) -> Result<Vec<u8>, SigningError> {
    let signature = signing_key
        .try_sign(data_hash)
        .map_err(|_| SigningError::SigningFailure)?;
    Ok(signature.to_bytes().to_vec())
}
