//! DKIM public key record.

use crate::{
    crypto::{HashAlgorithm, KeyType},
    tag_list::{
        parse_base64_tag_value, parse_colon_separated_tag_value, parse_qp_section_tag_value,
        TagList, TagSpec,
    },
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceType {
    Any,
    Email,
    Other(Box<str>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flags {
    Testing,
    NoSubdomains,
    Other(Box<str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DkimKeyRecordParseError {
    RecordSyntax,
    InvalidQuotedPrintable,
    InvalidBase64,
    TagListSyntax,
    UnsupportedVersion,
    MisplacedVersionTag,
    UnsupportedKeyType,
    NoSupportedHashAlgorithms,
    RevokedKey,
    MissingKeyTag,
    ServiceTypesEmpty,
}

impl Display for DkimKeyRecordParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordSyntax => write!(f, "ill-formed key record"),
            Self::InvalidQuotedPrintable => write!(f, "invalid Quoted-Printable string"),
            Self::InvalidBase64 => write!(f, "invalid Base64 string"),
            Self::TagListSyntax => write!(f, "invalid tag-list"),
            Self::UnsupportedVersion => write!(f, "unsupported version"),
            Self::MisplacedVersionTag => write!(f, "v= tag not initial"),
            Self::UnsupportedKeyType => write!(f, "unsupported key type"),
            Self::NoSupportedHashAlgorithms => write!(f, "no supported hash algorithms"),
            Self::RevokedKey => write!(f, "key revoked"),
            Self::MissingKeyTag => write!(f, "p= tag missing"),
            Self::ServiceTypesEmpty => write!(f, "service types empty"),
        }
    }
}

impl Error for DkimKeyRecordParseError {}

/// A DKIM public key record, as published at
/// `<selector>._domainkey.<domain>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DkimKeyRecord {
    pub hash_algorithms: Box<[HashAlgorithm]>,  // non-empty
    pub key_type: KeyType,
    pub notes: Option<Box<str>>,
    pub key_data: Box<[u8]>,
    pub service_types: Box<[ServiceType]>,  // non-empty
    pub flags: Box<[Flags]>,
}

impl DkimKeyRecord {
    fn from_tag_list(tag_list: &TagList<'_>) -> Result<Self, DkimKeyRecordParseError> {
        let mut hash_algorithms = HashAlgorithm::all();
        let mut key_type = KeyType::Rsa;
        let mut notes = None;
        let mut key_data = None;
        let mut service_types = vec![ServiceType::Any];
        let mut flags = vec![];

        for (i, &TagSpec { name, value }) in tag_list.as_ref().iter().enumerate() {
            match name {
                "v" => {
                    if i != 0 {
                        return Err(DkimKeyRecordParseError::MisplacedVersionTag);
                    }
                    if value != "DKIM1" {
                        return Err(DkimKeyRecordParseError::UnsupportedVersion);
                    }
                }
                "h" => {
                    hash_algorithms.clear();

                    for s in parse_colon_separated_tag_value(value) {
                        if s.eq_ignore_ascii_case("sha256") {
                            hash_algorithms.push(HashAlgorithm::Sha256);
                        } else {
                            #[cfg(feature = "pre-rfc8301")]
                            if s.eq_ignore_ascii_case("sha1") {
                                hash_algorithms.push(HashAlgorithm::Sha1);
                            }
                        }
                    }

                    if hash_algorithms.is_empty() {
                        return Err(DkimKeyRecordParseError::NoSupportedHashAlgorithms);
                    }
                }
                "k" => {
                    if value.eq_ignore_ascii_case("ed25519") {
                        key_type = KeyType::Ed25519;
                    } else if !value.eq_ignore_ascii_case("rsa") {
                        return Err(DkimKeyRecordParseError::UnsupportedKeyType);
                    }
                }
                "n" => {
                    let s = parse_qp_section_tag_value(value)
                        .map_err(|_| DkimKeyRecordParseError::InvalidQuotedPrintable)?;

                    // notes are for humans, lossy UTF-8 is good enough
                    notes = Some(String::from_utf8_lossy(&s).into());
                }
                "p" => {
                    if value.is_empty() {
                        return Err(DkimKeyRecordParseError::RevokedKey);
                    }

                    let s = parse_base64_tag_value(value)
                        .map_err(|_| DkimKeyRecordParseError::InvalidBase64)?;

                    key_data = Some(s.into());
                }
                "s" => {
                    let st: Vec<_> = parse_colon_separated_tag_value(value)
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .map(|s| {
                            if s == "*" {
                                ServiceType::Any
                            } else if s.eq_ignore_ascii_case("email") {
                                ServiceType::Email
                            } else {
                                ServiceType::Other(s.into())
                            }
                        })
                        .collect();

                    if st.is_empty() {
                        return Err(DkimKeyRecordParseError::ServiceTypesEmpty);
                    }

                    service_types = st;
                }
                "t" => {
                    flags = parse_colon_separated_tag_value(value)
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .map(|s| {
                            if s.eq_ignore_ascii_case("y") {
                                Flags::Testing
                            } else if s.eq_ignore_ascii_case("s") {
                                Flags::NoSubdomains
                            } else {
                                Flags::Other(s.into())
                            }
                        })
                        .collect();
                }
                // RFC 6376, §3.6.1: unknown tags must be ignored
                _ => {}
            }
        }

        let key_data = key_data.ok_or(DkimKeyRecordParseError::MissingKeyTag)?;

        Ok(Self {
            hash_algorithms: hash_algorithms.into(),
            key_type,
            notes,
            key_data,
            service_types: service_types.into(),
            flags: flags.into(),
        })
    }
}

impl FromStr for DkimKeyRecord {
    type Err = DkimKeyRecordParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag_list =
            TagList::from_str(s).map_err(|_| DkimKeyRecordParseError::TagListSyntax)?;

        Self::from_tag_list(&tag_list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dkim_key_record_from_str_ok() {
        let record =
            DkimKeyRecord::from_str("v=DKIM1; p=YWJj; s = email; n = highly=20interesting;")
                .unwrap();

        assert_eq!(
            record,
            DkimKeyRecord {
                hash_algorithms: HashAlgorithm::all().into(),
                key_type: KeyType::Rsa,
                notes: Some("highly interesting".into()),
                key_data: b"abc".to_vec().into(),
                service_types: [ServiceType::Email].into(),
                flags: [].into(),
            }
        );
    }

    #[test]
    fn dkim_key_record_from_str_options() {
        let record = DkimKeyRecord::from_str("v=DKIM1; g=*; k=ed25519; h=sha256; t=y:s; p=YWJj")
            .unwrap();

        assert_eq!(record.key_type, KeyType::Ed25519);
        assert_eq!(record.hash_algorithms.as_ref(), [HashAlgorithm::Sha256]);
        assert_eq!(record.flags.as_ref(), [Flags::Testing, Flags::NoSubdomains]);
        assert_eq!(record.service_types.as_ref(), [ServiceType::Any]);
    }

    #[test]
    fn dkim_key_record_from_str_errors() {
        use DkimKeyRecordParseError::*;

        assert_eq!(DkimKeyRecord::from_str("v=DKIM1; k=rsa"), Err(MissingKeyTag));
        assert_eq!(DkimKeyRecord::from_str("v=DKIM1; k=rsa; p="), Err(RevokedKey));
        assert_eq!(DkimKeyRecord::from_str("v=DKIM1; p=YW*j"), Err(InvalidBase64));
        assert_eq!(DkimKeyRecord::from_str("k=rsa; v=DKIM1; p=YWJj"), Err(MisplacedVersionTag));
        assert_eq!(DkimKeyRecord::from_str("v=DKIM2; p=YWJj"), Err(UnsupportedVersion));
        assert_eq!(DkimKeyRecord::from_str("k=dsa; p=YWJj"), Err(UnsupportedKeyType));
        assert_eq!(DkimKeyRecord::from_str("h=md5; p=YWJj"), Err(NoSupportedHashAlgorithms));
        assert_eq!(DkimKeyRecord::from_str("p=YWJj; p=YWJj"), Err(TagListSyntax));
    }

    #[test]
    fn dkim_key_record_from_str_bare_lf() {
        // Real-world record using LF instead of CRLF in folding whitespace.
        let s = "v=DKIM1; h=sha256; k=rsa; \n\t  p=MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAxjVprCb0";

        assert!(DkimKeyRecord::from_str(s).is_err());
    }
}
