use crate::crypto::HashAlgorithm;
use digest::{Digest, DynDigest};
#[cfg(feature = "pre-rfc8301")]
use sha1::Sha1;
use sha2::Sha256;
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Computes the digest of the concatenation of the given slices.
pub fn digest<I, T>(hash_alg: HashAlgorithm, slices: I) -> Box<[u8]>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = CountingHasher::new(hash_alg);
    for bytes in slices {
        hasher.digest.update(bytes.as_ref());
    }
    hasher.digest.finalize()
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct LengthOverflow;

impl Display for LengthOverflow {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "input length overflow")
    }
}

impl Error for LengthOverflow {}

/// A hasher that keeps count of the bytes digested.
pub struct CountingHasher {
    digest: Box<dyn DynDigest + Send>,
    bytes_written: u64,
}

impl CountingHasher {
    pub fn new(hash_alg: HashAlgorithm) -> Self {
        let digest: Box<dyn DynDigest + Send> = match hash_alg {
            HashAlgorithm::Sha256 => Box::new(Sha256::new()),
            #[cfg(feature = "pre-rfc8301")]
            HashAlgorithm::Sha1 => Box::new(Sha1::new()),
        };

        Self {
            digest,
            bytes_written: 0,
        }
    }

    pub fn update(&mut self, bytes: &[u8]) -> Result<(), LengthOverflow> {
        let len = u64::try_from(bytes.len()).map_err(|_| LengthOverflow)?;
        self.bytes_written = self.bytes_written.checked_add(len).ok_or(LengthOverflow)?;
        self.digest.update(bytes);
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn finish(self) -> (Box<[u8]>, u64) {
        (self.digest.finalize(), self.bytes_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::encode_base64;

    #[test]
    fn counting_hasher_ok() {
        let mut hasher = CountingHasher::new(HashAlgorithm::Sha256);
        assert_eq!(hasher.update(b"ab"), Ok(()));
        assert_eq!(hasher.update(b""), Ok(()));
        assert_eq!(hasher.update(b"c"), Ok(()));
        assert_eq!(hasher.bytes_written(), 3);

        let (hash, len) = hasher.finish();
        assert_eq!(len, 3);
        assert_eq!(hash, digest(HashAlgorithm::Sha256, [b"abc"]));
    }

    #[test]
    fn digest_rfc_examples() {
        // RFC 6376, §3.4.3
        let hash = digest(HashAlgorithm::Sha256, [b"\r\n"]);
        assert_eq!(encode_base64(hash), "frcCV1k9oG9oKj3dpUqdJg1PxRT2RSN/XKdLCPjaYaY=");

        // RFC 6376, §3.4.4
        let hash = digest(HashAlgorithm::Sha256, [b""]);
        assert_eq!(encode_base64(hash), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[cfg(feature = "pre-rfc8301")]
    #[test]
    fn digest_rfc_examples_sha1() {
        let hash = digest(HashAlgorithm::Sha1, [b"\r\n"]);
        assert_eq!(encode_base64(hash), "uoq1oCgLlTqpdDX/iUbLy7J1Wic=");
    }
}
