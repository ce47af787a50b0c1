use crate::{
    crypto::{KeyError, SigningKey},
    header::FieldName,
    signature::{
        Canonicalization, CanonicalizationAlgorithm, DomainName, Identity, Selector,
        SignatureAlgorithm,
    },
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::trace;

/// An error that occurs when configuring a signer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConfigError {
    InvalidDomain,
    InvalidSelector,
    InvalidIdentity,
    IdentityDomainMismatch,
    IncompatibleKeyType,
    InvalidKey,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain => write!(f, "invalid signing domain"),
            Self::InvalidSelector => write!(f, "invalid selector"),
            Self::InvalidIdentity => write!(f, "invalid agent or user identifier"),
            Self::IdentityDomainMismatch => {
                write!(f, "identity domain is not the signing domain or a subdomain")
            }
            Self::IncompatibleKeyType => write!(f, "signing key incompatible with algorithm"),
            Self::InvalidKey => write!(f, "invalid signing key"),
        }
    }
}

impl Error for ConfigError {}

impl From<KeyError> for ConfigError {
    fn from(_: KeyError) -> Self {
        Self::InvalidKey
    }
}

/// A generator for the timestamp tag.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Timestamp {
    /// The current system time.
    #[default]
    Now,
    /// A fixed number of seconds since the Unix epoch.
    Exact(u64),
}

impl Timestamp {
    pub fn to_unix_secs(self) -> u64 {
        match self {
            Self::Now => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            Self::Exact(secs) => secs,
        }
    }
}

/// The header names signed by default, in order.
pub const DEFAULT_SIGNED_HEADERS: [&str; 28] = [
    "Content-Description",
    "Content-ID",
    "Content-Type",
    "Content-Transfer-Encoding",
    "Cc",
    "Date",
    "From",
    "In-Reply-To",
    "List-Subscribe",
    "List-Post",
    "List-Owner",
    "List-Id",
    "List-Archive",
    "List-Help",
    "List-Unsubscribe",
    "MIME-Version",
    "Message-ID",
    "Resent-Sender",
    "Resent-Cc",
    "Resent-Date",
    "Resent-To",
    "Reply-To",
    "References",
    "Resent-Message-ID",
    "Resent-From",
    "Sender",
    "Subject",
    "To",
];

/// Headers that must be present and signed in every signature.
pub const MANDATORY_HEADERS: [&str; 3] = ["From", "To", "Subject"];

/// An ordered set of header names eligible for signing.
///
/// Membership is exact (case-sensitive). Insertion order is preserved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedHeaders(Vec<FieldName>);

impl SignedHeaders {
    pub fn new() -> Self {
        Self(vec![])
    }

    pub fn contains(&self, name: &FieldName) -> bool {
        self.0.contains(name)
    }

    /// Appends a header name. Returns false and leaves the set unchanged if
    /// the name is already present or is not a valid field name.
    pub fn insert(&mut self, name: &str) -> bool {
        // ‘;’ cannot be represented in the h= tag
        if name.contains(';') {
            return false;
        }
        match FieldName::new(name) {
            Ok(name) if !self.0.contains(&name) => {
                self.0.push(name);
                true
            }
            _ => false,
        }
    }

    /// Removes a header name. Returns false if the name was not present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.0.iter().position(|n| *n == name) {
            Some(i) => {
                self.0.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldName> {
        self.0.iter()
    }
}

impl Default for SignedHeaders {
    fn default() -> Self {
        let mut headers = Self::new();
        for name in DEFAULT_SIGNED_HEADERS {
            headers.insert(name);
        }
        headers
    }
}

impl AsRef<[FieldName]> for SignedHeaders {
    fn as_ref(&self) -> &[FieldName] {
        &self.0
    }
}

/// Configuration of a signer: key, algorithm, names, and options.
///
/// Setters validate their input and leave the configuration unchanged on
/// error. The signing domain cannot be changed after construction.
#[derive(Clone, Debug)]
pub struct SigningConfig {
    domain: DomainName,
    selector: Selector,
    identity: Option<Identity>,
    signing_key: SigningKey,
    algorithm: SignatureAlgorithm,
    canonicalization: Canonicalization,
    length_param: bool,
    z_param: bool,
    timestamp: Timestamp,
    signed_headers: SignedHeaders,
}

impl SigningConfig {
    /// Creates a configuration with default options. The signature algorithm
    /// is chosen according to the type of the signing key.
    pub fn new(domain: &str, selector: &str, signing_key: SigningKey) -> Result<Self, ConfigError> {
        let domain = DomainName::new(domain).map_err(|_| ConfigError::InvalidDomain)?;
        let selector = Selector::new(selector.trim()).map_err(|_| ConfigError::InvalidSelector)?;

        let algorithm = match signing_key {
            SigningKey::Rsa(_) => SignatureAlgorithm::RsaSha256,
            SigningKey::Ed25519(_) => SignatureAlgorithm::Ed25519Sha256,
        };

        trace!(%domain, %selector, %algorithm, "created signing configuration");

        Ok(Self {
            domain,
            selector,
            identity: None,
            signing_key,
            algorithm,
            canonicalization: Canonicalization {
                header: CanonicalizationAlgorithm::Relaxed,
                body: CanonicalizationAlgorithm::Simple,
            },
            length_param: false,
            z_param: false,
            timestamp: Timestamp::Now,
            signed_headers: SignedHeaders::default(),
        })
    }

    pub fn domain(&self) -> &DomainName {
        &self.domain
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Sets or clears the agent or user identifier (*i=* tag). Its domain must
    /// be the signing domain or a subdomain of it.
    pub fn set_identity(&mut self, identity: Option<&str>) -> Result<(), ConfigError> {
        let identity = match identity {
            Some(s) => {
                let identity = Identity::new(s).map_err(|_| ConfigError::InvalidIdentity)?;
                if !identity.domain_part.eq_or_subdomain_of(&self.domain) {
                    return Err(ConfigError::IdentityDomainMismatch);
                }
                Some(identity)
            }
            None => None,
        };
        self.identity = identity;
        Ok(())
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Replaces the signing key. The key must fit the configured algorithm.
    pub fn set_signing_key(&mut self, signing_key: SigningKey) -> Result<(), ConfigError> {
        if signing_key.key_type() != self.algorithm.key_type() {
            return Err(ConfigError::IncompatibleKeyType);
        }
        self.signing_key = signing_key;
        Ok(())
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Sets the signature algorithm. The algorithm must fit the signing key.
    pub fn set_algorithm(&mut self, algorithm: SignatureAlgorithm) -> Result<(), ConfigError> {
        if algorithm.key_type() != self.signing_key.key_type() {
            return Err(ConfigError::IncompatibleKeyType);
        }
        self.algorithm = algorithm;
        Ok(())
    }

    pub fn canonicalization(&self) -> Canonicalization {
        self.canonicalization
    }

    pub fn set_header_canonicalization(&mut self, algorithm: CanonicalizationAlgorithm) {
        self.canonicalization.header = algorithm;
    }

    pub fn set_body_canonicalization(&mut self, algorithm: CanonicalizationAlgorithm) {
        self.canonicalization.body = algorithm;
    }

    pub fn length_param(&self) -> bool {
        self.length_param
    }

    /// Whether to record the canonical body length in the *l=* tag.
    pub fn set_length_param(&mut self, value: bool) {
        self.length_param = value;
    }

    pub fn z_param(&self) -> bool {
        self.z_param
    }

    /// Whether to record the signed headers in the *z=* tag, for debugging.
    pub fn set_z_param(&mut self, value: bool) {
        self.z_param = value;
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn signed_headers(&self) -> &SignedHeaders {
        &self.signed_headers
    }

    pub fn add_header_to_sign(&mut self, name: &str) -> bool {
        self.signed_headers.insert(name)
    }

    pub fn remove_header_to_sign(&mut self, name: &str) -> bool {
        self.signed_headers.remove(name)
    }
}
