use dkimsign::{
    header::HeaderFields,
    lookup::LookupTxt,
    signer::{Signer, SigningConfig, Timestamp},
    SigningKey,
};
use std::{future::Future, io, pin::Pin, sync::Arc};
use tokio::fs;

pub type LookupOutput = Vec<io::Result<Vec<u8>>>;
pub type LookupFuture<'a> = Pin<Box<dyn Future<Output = io::Result<LookupOutput>> + Send + 'a>>;

#[derive(Clone)]
pub struct MockLookup(Arc<dyn Fn(&str) -> LookupFuture<'_> + Send + Sync>);

impl MockLookup {
    pub fn new(f: impl Fn(&str) -> LookupFuture<'_> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl LookupTxt for MockLookup {
    type Answer = LookupOutput;
    type Query<'a> = Pin<Box<dyn Future<Output = io::Result<Self::Answer>> + Send + 'a>>;

    fn lookup_txt(&self, domain: &str) -> Self::Query<'_> {
        let domain = domain.to_owned();

        Box::pin(async move { self.0(&domain).await })
    }
}

pub async fn read_public_key_file_base64(file_name: &str) -> io::Result<String> {
    let s = fs::read_to_string(file_name).await?;
    let mut key_base64: Vec<_> = s.lines().skip(1).collect();
    key_base64.pop();
    Ok(key_base64.join(""))
}

pub async fn read_signing_key_from_file(file_name: &str) -> io::Result<SigningKey> {
    let s = fs::read_to_string(file_name).await?;
    Ok(SigningKey::from_pkcs8_pem(&s).unwrap())
}

/// Makes a signer for example.com with selector sel, and a fixed timestamp.
pub async fn make_signer(key_file: &str) -> Signer {
    let signing_key = read_signing_key_from_file(key_file).await.unwrap();

    let mut config = SigningConfig::new("example.com", "sel", signing_key).unwrap();
    config.set_timestamp(Timestamp::Exact(1686737001));

    Signer::new(config)
}

pub fn make_header_fields() -> HeaderFields {
    "Message-ID: <1511928109048645963@gluet.ch>
Date: Fri, 9 Jun 2023 16:13:12 +0200
MIME-Version: 1.0
Content-Type: text/plain; charset=utf-8
Content-Disposition: inline
Content-Transfer-Encoding: 8bit
References: <4344283917108237944@example.com>
 <3993077819152979884@gluet.ch>
 <3209900529850518454@example.com>
In-Reply-To: <3209900529850518454@example.com>
From: me <me@gluet.ch>
To: you@example.com
Subject: Re:  Lunch   today?"
        .parse()
        .unwrap()
}

pub fn make_body() -> Vec<u8> {
    "Hallo!

Here is some trailing whitespace:\x20\x20
  <- and some leading whitespace
\tand a tab.

Das wars!


"
    .replace('\n', "\r\n")
    .bytes()
    .collect()
}

/// Extracts the decoded *b=* tag value from a formatted signature header.
pub fn signature_data(header: &str) -> Vec<u8> {
    let (_, b) = header.split_once("\tb=").unwrap();
    let b: String = b.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    dkimsign::decode_base64(&b).unwrap()
}
