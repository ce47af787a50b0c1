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

//! Public key record lookup.
//!
//! This is a best-effort check that the public key matching a signing
//! configuration is published in DNS. It is independent of signing.

#[cfg(feature = "hickory-resolver")]
mod hickory_resolver;

use crate::{
    crypto::{VerificationError, VerifyingKey},
    record::{DkimKeyRecord, DkimKeyRecordParseError},
    signature::{DomainName, Selector},
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    future::Future,
    io::{self, ErrorKind},
    time::Duration,
};
use tokio::time;
use tracing::{debug, trace};

/// A trait for looking up DNS TXT records containing DKIM public key records.
///
/// The error type used here is `std::io::Error`. The following error kinds on
/// the query result are recognised and receive special treatment.
///
/// * `ErrorKind::InvalidInput` on the query: the domain argument could not be used
/// * `ErrorKind::NotFound` on the query: NXDOMAIN, no key record found
/// * `ErrorKind::TimedOut` on the query: timeout
///
/// The inner, per-record `std::io::Error` can be used to signal errors
/// (parsing, encoding) with individual TXT records.
pub trait LookupTxt: Send + Sync {
    /// The answer consisting of TXT records found.
    type Answer: IntoIterator<Item = io::Result<Vec<u8>>>;
    /// The future resolving to the query’s answer.
    type Query<'a>: Future<Output = io::Result<Self::Answer>> + Send + 'a
    where
        Self: 'a;

    /// Looks up the domain’s TXT records in DNS.
    ///
    /// The domain will be passed to this trait as a string in human-readable
    /// A-label (ASCII) format (eg `selector._domainkey.example.com.`).
    fn lookup_txt(&self, domain: &str) -> Self::Query<'_>;
}

/// Configuration for the public key lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// The maximum duration of the key record lookup.
    pub lookup_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(10),
        }
    }
}

/// An error that occurs when looking up a public key.
#[derive(Debug)]
pub enum LookupError {
    InvalidName,
    NoRecord,
    Timeout,
    Lookup(io::Error),
    InvalidRecord(DkimKeyRecordParseError),
    InvalidKey(VerificationError),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "invalid query name"),
            Self::NoRecord => write!(f, "no key record found"),
            Self::Timeout => write!(f, "lookup timed out"),
            Self::Lookup(e) => write!(f, "lookup failed: {e}"),
            Self::InvalidRecord(e) => write!(f, "invalid key record: {e}"),
            Self::InvalidKey(e) => write!(f, "invalid public key: {e}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Lookup(e) => Some(e),
            Self::InvalidRecord(e) => Some(e),
            Self::InvalidKey(e) => Some(e),
            Self::InvalidName | Self::NoRecord | Self::Timeout => None,
        }
    }
}

impl From<io::Error> for LookupError {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            ErrorKind::InvalidInput => Self::InvalidName,
            ErrorKind::NotFound => Self::NoRecord,
            ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Lookup(error),
        }
    }
}

/// Checks that a usable public key is published at
/// `<selector>._domainkey.<domain>`, and returns it.
///
/// If several TXT records are found, the first one that yields a key is used;
/// if none does, the error for the first record is returned.
pub async fn check_public_key<T>(
    resolver: &T,
    config: &Config,
    domain: &DomainName,
    selector: &Selector,
) -> Result<VerifyingKey, LookupError>
where
    T: LookupTxt + ?Sized,
{
    // Note the trailing dot: only absolute queries.
    let dname = format!("{}._domainkey.{}.", selector.to_ascii(), domain.to_ascii());

    trace!(%dname, "looking up public key record");

    let txts = match time::timeout(config.lookup_timeout, resolver.lookup_txt(&dname)).await {
        Ok(r) => r?,
        Err(_) => {
            debug!(%dname, "public key lookup timed out");
            return Err(LookupError::Timeout);
        }
    };

    let mut first_error = None;

    for txt in txts {
        match read_verifying_key(txt) {
            Ok(key) => {
                debug!(%dname, key_type = %key.key_type(), "found public key");
                return Ok(key);
            }
            Err(e) => {
                trace!(%dname, "unusable key record: {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or(LookupError::NoRecord))
}

fn read_verifying_key(txt: io::Result<Vec<u8>>) -> Result<VerifyingKey, LookupError> {
    let txt = txt.map_err(LookupError::Lookup)?;

    let s = String::from_utf8(txt)
        .map_err(|_| LookupError::InvalidRecord(DkimKeyRecordParseError::RecordSyntax))?;

    let record: DkimKeyRecord = s.parse().map_err(LookupError::InvalidRecord)?;

    VerifyingKey::from_key_data(record.key_type, &record.key_data)
        .map_err(LookupError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{pin::Pin, sync::Mutex};

    struct MockLookup {
        answer: Result<Vec<&'static str>, ErrorKind>,
        delay: Option<Duration>,
        queried: Mutex<Vec<String>>,
    }

    impl MockLookup {
        fn new(answer: Result<Vec<&'static str>, ErrorKind>) -> Self {
            Self {
                answer,
                delay: None,
                queried: Mutex::new(vec![]),
            }
        }
    }

    impl LookupTxt for MockLookup {
        type Answer = Vec<io::Result<Vec<u8>>>;
        type Query<'a> = Pin<Box<dyn Future<Output = io::Result<Self::Answer>> + Send + 'a>>;

        fn lookup_txt(&self, domain: &str) -> Self::Query<'_> {
            self.queried.lock().unwrap().push(domain.into());

            Box::pin(async move {
                if let Some(delay) = self.delay {
                    time::sleep(delay).await;
                }
                match &self.answer {
                    Ok(txts) => Ok(txts.iter().map(|s| Ok(s.as_bytes().to_vec())).collect()),
                    Err(kind) => Err((*kind).into()),
                }
            })
        }
    }

    const ED25519_RECORD: &str = "v=DKIM1; k=ed25519; p=11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=";

    async fn check(resolver: &MockLookup) -> Result<VerifyingKey, LookupError> {
        let domain = DomainName::new("example.com").unwrap();
        let selector = Selector::new("sel").unwrap();

        check_public_key(resolver, &Config::default(), &domain, &selector).await
    }

    #[tokio::test]
    async fn check_public_key_ok() {
        let resolver = MockLookup::new(Ok(vec![ED25519_RECORD]));

        let key = check(&resolver).await.unwrap();

        assert_eq!(key.key_type(), crate::crypto::KeyType::Ed25519);
        assert_eq!(
            *resolver.queried.lock().unwrap(),
            ["sel._domainkey.example.com."]
        );
    }

    #[tokio::test]
    async fn check_public_key_first_usable_record() {
        let resolver = MockLookup::new(Ok(vec!["v=DKIM1; p=", ED25519_RECORD]));

        assert!(check(&resolver).await.is_ok());

        let resolver = MockLookup::new(Ok(vec!["v=DKIM1; p=", "k=rsa"]));

        assert!(matches!(
            check(&resolver).await,
            Err(LookupError::InvalidRecord(DkimKeyRecordParseError::RevokedKey))
        ));
    }

    #[tokio::test]
    async fn check_public_key_query_errors() {
        let resolver = MockLookup::new(Err(ErrorKind::NotFound));
        assert!(matches!(check(&resolver).await, Err(LookupError::NoRecord)));

        let resolver = MockLookup::new(Ok(vec![]));
        assert!(matches!(check(&resolver).await, Err(LookupError::NoRecord)));

        let resolver = MockLookup::new(Err(ErrorKind::TimedOut));
        assert!(matches!(check(&resolver).await, Err(LookupError::Timeout)));

        let resolver = MockLookup::new(Err(ErrorKind::ConnectionRefused));
        assert!(matches!(check(&resolver).await, Err(LookupError::Lookup(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn check_public_key_timeout() {
        let mut resolver = MockLookup::new(Ok(vec![ED25519_RECORD]));
        resolver.delay = Some(Duration::from_secs(60));

        assert!(matches!(check(&resolver).await, Err(LookupError::Timeout)));
    }
}
