//! Signer and supporting types.
//!
//! A [`Signer`] holds a [`SigningConfig`] and produces a `DKIM-Signature`
//! header for each message handed to it.
//!
//! ```no_run
//! use dkimsign::{HeaderFields, Signer, SigningConfig, SigningKey};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pem = std::fs::read_to_string("private.pem")?;
//! let key = SigningKey::from_pkcs8_pem(&pem)?;
//!
//! let config = SigningConfig::new("example.com", "sel1", key)?;
//! let signer = Signer::new(config);
//!
//! let headers: HeaderFields = "From: me@example.com\n\
//!     To: you@example.org\n\
//!     Subject: Hello\n".parse()?;
//!
//! let result = signer.sign(&headers, b"Hi there!\r\n")?;
//!
//! println!("{}", result.format_header());
//! # Ok(())
//! # }
//! ```

mod config;
mod format;
mod sign;

pub use crate::signer::{
    config::{
        ConfigError, SignedHeaders, SigningConfig, Timestamp, DEFAULT_SIGNED_HEADERS,
        MANDATORY_HEADERS,
    },
    format::{fold_signature_data, UnsignedDkimSignature, LINE_WIDTH},
    sign::BodyHasher,
};

use crate::header::{FieldName, HeaderFields};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io::{self, ErrorKind, Read},
};
use tracing::trace;

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// An error that occurs when using a [`Signer`].
#[derive(Debug)]
pub enum SignerError {
    Config(ConfigError),
    /// Some of the headers From, To, and Subject are not among the signed
    /// headers of the message.
    MissingHeaders(Vec<FieldName>),
    Canonicalization(io::Error),
    SigningFailure,
    /// The canonical body length does not fit into the supported integer
    /// type.
    Overflow,
}

impl Display for SignerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::MissingHeaders(names) => {
                write!(f, "missing required headers:")?;
                for name in names {
                    write!(f, " {name}")?;
                }
                Ok(())
            }
            Self::Canonicalization(e) => write!(f, "failed to read message body: {e}"),
            Self::SigningFailure => write!(f, "failed to create signature"),
            Self::Overflow => write!(f, "integer too large"),
        }
    }
}

impl Error for SignerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Canonicalization(e) => Some(e),
            Self::MissingHeaders(_) | Self::SigningFailure | Self::Overflow => None,
        }
    }
}

impl From<ConfigError> for SignerError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

/// The result of signing a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningResult {
    pub header_name: String,
    /// The folded header value. It starts with a space and must be joined to
    /// the name with only a colon in between.
    pub header_value: String,
    /// The names of the signed headers, in the order they were signed.
    pub signed_headers: Vec<FieldName>,
    /// The body length, if the *l=* tag was included.
    pub body_length: Option<u64>,
}

impl SigningResult {
    /// Formats the complete header field, without trailing line break.
    pub fn format_header(&self) -> String {
        format!("{}:{}", self.header_name, self.header_value)
    }
}

/// A signer for email messages.
pub struct Signer {
    config: SigningConfig,
}

impl Signer {
    pub fn new(config: SigningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SigningConfig {
        &mut self.config
    }

    /// Signs a message given as header fields and body.
    pub fn sign(&self, headers: &HeaderFields, body: &[u8]) -> Result<SigningResult, SignerError> {
        let selected = sign::select_headers(headers, self.config.signed_headers())?;

        let mut body_hasher = self.body_hasher();
        body_hasher.hash_chunk(body)?;
        let (body_hash, body_length) = body_hasher.finish()?;

        sign::perform_signing(&self.config, &selected, body_hash, body_length)
    }

    /// Signs a message whose body is read from a reader.
    ///
    /// The body is canonicalized and hashed as it is read, and not otherwise
    /// retained in memory.
    pub fn sign_reader<R: Read>(
        &self,
        headers: &HeaderFields,
        mut body: R,
    ) -> Result<SigningResult, SignerError> {
        let selected = sign::select_headers(headers, self.config.signed_headers())?;

        let mut body_hasher = self.body_hasher();
        let mut buf = vec![0; READ_BUFFER_SIZE];

        loop {
            let n = match body.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(SignerError::Canonicalization(e)),
            };
            body_hasher.hash_chunk(&buf[..n])?;
        }

        let (body_hash, body_length) = body_hasher.finish()?;

        sign::perform_signing(&self.config, &selected, body_hash, body_length)
    }

    fn body_hasher(&self) -> BodyHasher {
        let hash_alg = self.config.algorithm().hash_algorithm();
        let canon_alg = self.config.canonicalization().body;

        trace!("hashing body with {hash_alg:?} and {canon_alg:?} canonicalization");

        BodyHasher::new(hash_alg, canon_alg)
    }
}
