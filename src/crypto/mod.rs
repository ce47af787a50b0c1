//! Cryptographic utilities.
//!
//! # DKIM public keys in DNS
//!
//! RFC 6376, section 3.6.1 states that the *p=* tag of an RSA key record
//! contains an RSA public key in format RSAPublicKey (RFC 3447), while the
//! example in appendix C installs a key in format SubjectPublicKeyInfo (RFC
//! 5280). The latter has become the de facto standard. RSA public keys are
//! therefore read as SubjectPublicKeyInfo first, and as RSAPublicKey second.
//!
//! RFC 8463 mandates that the 32 raw bytes of an Ed25519 public key be
//! installed in DNS. OpenSSL outputs Ed25519 public keys in
//! SubjectPublicKeyInfo format only, so that format is accepted as a fallback.

mod ed25519;
mod hash;
mod rsa;

pub use self::{
    ed25519::{read_ed25519_verifying_key, sign_ed25519},
    hash::{digest, CountingHasher, LengthOverflow},
    rsa::{read_rsa_public_key, sign_rsa},
};

use crate::util::CanonicalStr;
use ::rsa::{RsaPrivateKey, RsaPublicKey};
use ed25519_dalek::{SigningKey as Ed25519SigningKey, VerifyingKey as Ed25519VerifyingKey};
use pkcs8::{der::pem::PemLabel, Document, PrivateKeyInfo};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyError {
    InvalidPem,
    InvalidFormat,
    UnsupportedKeyType,
}

impl Display for KeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPem => write!(f, "not a PKCS#8 PEM document"),
            Self::InvalidFormat => write!(f, "invalid private key format"),
            Self::UnsupportedKeyType => write!(f, "unsupported private key type"),
        }
    }
}

impl Error for KeyError {}

/// A private key used for signing.
#[derive(Clone, Debug)]
pub enum SigningKey {
    Rsa(RsaPrivateKey),
    Ed25519(Ed25519SigningKey),
}

impl SigningKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Reads a private key from PKCS#8 DER data.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyError> {
        let pk = PrivateKeyInfo::try_from(der).map_err(|_| KeyError::InvalidFormat)?;

        // PrivateKeyInfo is lightweight, cloning is cheap
        if let Ok(rpk) = RsaPrivateKey::try_from(pk.clone()) {
            Ok(Self::Rsa(rpk))
        } else if let Ok(esk) = Ed25519SigningKey::try_from(pk) {
            Ok(Self::Ed25519(esk))
        } else {
            Err(KeyError::UnsupportedKeyType)
        }
    }

    /// Reads a private key from a PKCS#8 PEM document (`BEGIN PRIVATE KEY`).
    pub fn from_pkcs8_pem(s: &str) -> Result<Self, KeyError> {
        let (label, der) = Document::from_pem(s).map_err(|_| KeyError::InvalidPem)?;

        PrivateKeyInfo::validate_pem_label(label).map_err(|_| KeyError::InvalidPem)?;

        Self::from_pkcs8_der(der.as_bytes())
    }
}

impl From<RsaPrivateKey> for SigningKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self::Rsa(key)
    }
}

impl From<Ed25519SigningKey> for SigningKey {
    fn from(key: Ed25519SigningKey) -> Self {
        Self::Ed25519(key)
    }
}

/// A public key, as published in a DKIM key record.
#[derive(Clone, Debug)]
pub enum VerifyingKey {
    Rsa(RsaPublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl VerifyingKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa(_) => KeyType::Rsa,
            Self::Ed25519(_) => KeyType::Ed25519,
        }
    }

    /// Returns the key size in bits, for RSA keys.
    pub fn key_size(&self) -> Option<usize> {
        match self {
            Self::Rsa(public_key) => Some(self::rsa::get_public_key_size(public_key)),
            Self::Ed25519(_) => None,
        }
    }

    pub fn from_key_data(key_type: KeyType, key_data: &[u8]) -> Result<Self, VerificationError> {
        match key_type {
            KeyType::Rsa => {
                let public_key = read_rsa_public_key(key_data)?;
                Ok(Self::Rsa(public_key))
            }
            KeyType::Ed25519 => {
                let verifying_key = read_ed25519_verifying_key(key_data)?;
                Ok(Self::Ed25519(verifying_key))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum KeyType {
    Rsa,
    Ed25519,
}

impl CanonicalStr for KeyType {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Rsa => "rsa",
            Self::Ed25519 => "ed25519",
        }
    }
}

impl Display for KeyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HashAlgorithm {
    Sha256,
    #[cfg(feature = "pre-rfc8301")]
    Sha1,
}

impl HashAlgorithm {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Sha256,
            #[cfg(feature = "pre-rfc8301")]
            Self::Sha1,
        ]
    }
}

impl CanonicalStr for HashAlgorithm {
    fn canonical_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            #[cfg(feature = "pre-rfc8301")]
            Self::Sha1 => "sha1",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationError {
    InvalidKey,
    InsufficientKeySize,
}

impl Display for VerificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "invalid key data"),
            Self::InsufficientKeySize => write!(f, "key too small"),
        }
    }
}

impl Error for VerificationError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SigningError {
    SigningFailure,
}

impl Display for SigningError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::SigningFailure => write!(f, "failed to produce signature"),
        }
    }
}

impl Error for SigningError {}
