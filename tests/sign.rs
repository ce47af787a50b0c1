pub mod common;

use dkimsign::{
    header::HeaderFields,
    signature::{CanonicalizationAlgorithm, SignatureAlgorithm},
    signer::{SignerError, Timestamp},
    SigningKey,
};
use std::io::Cursor;

#[tokio::test]
async fn basic_sign() {
    let _ = tracing_subscriber::fmt::try_init();

    let headers = common::make_header_fields();
    let body = common::make_body();

    let signer = common::make_signer("tests/keys/rsa2048.pem").await;

    let sig = signer.sign(&headers, &body).unwrap();

    assert_eq!(
        sig.format_header(),
        "DKIM-Signature: v=1; a=rsa-sha256; q=dns/txt; c=relaxed/simple; t=1686737001;\r\n\
             \ts=sel; d=example.com;\r\n\
             \th=Message-ID:Date:MIME-Version:Content-Type:Content-Transfer-Encoding:References:In-Reply-To:From:To:Subject;\r\n\
             \tbh=AQgG+cgzhXqVEHy3u3Um+Vawf2tBRvFX77C8sqvvlOQ=;\r\n\
             \tb=WI4M3b3abEkoqw/0gF+tY1QU8XZ0NniFHvp37lCD5EdNJAtWtRdeS3RWVfT7rttp\r\n\
             \tBBLzW/tIGZeo8HPAjAJYEOxO4RzoE6AeM+xMsvtmK5UAPmXeoywqXkc2ucYzKJikeuL\r\n\
             \tRjcWkOgcq6nnbX8H2/Ypv7DikMauaWrZQQI7klnExoQZno48yyQOKqk/nSo0TZKzXRE\r\n\
             \tGuYHSwNWePe2oUKKhhwSNNcf9uMJAyVJbb5HsTaGzHO2Rl1QN6+SFHqwosx9WqbDPiA\r\n\
             \tvft4vBeSI6k1wKEBHZYr9tK4VzAqvcDHTZH6v3ev5yi/zhnBjT+lSVQ6JO7NWejaM3/\r\n\
             \tf6l5nYfvDg=="
    );
    assert_eq!(sig.body_length, None);
}

#[tokio::test]
async fn sign_ed25519_with_all_tags() {
    use CanonicalizationAlgorithm::*;

    let _ = tracing_subscriber::fmt::try_init();

    let headers = common::make_header_fields();
    let body = common::make_body();

    let mut signer = common::make_signer("tests/keys/ed25519.pem").await;

    let config = signer.config_mut();
    config.set_algorithm(SignatureAlgorithm::Ed25519Sha256).unwrap();
    config.set_header_canonicalization(Relaxed);
    config.set_body_canonicalization(Relaxed);
    config.set_identity(Some("joe@mail.example.com")).unwrap();
    config.set_length_param(true);
    config.set_z_param(true);

    let sig = signer.sign(&headers, &body).unwrap();

    assert_eq!(
        sig.format_header(),
        "DKIM-Signature: v=1; a=ed25519-sha256; q=dns/txt; c=relaxed/relaxed; t=1686737001;\r\n\
             \ts=sel; d=example.com; i=joe@mail.example.com;\r\n\
             \th=Message-ID:Date:MIME-Version:Content-Type:Content-Transfer-Encoding:References:In-Reply-To:From:To:Subject;\r\n\
             \tz=Message-ID:<1511928109048645963@gluet.ch>|Date:Fri,=209=20Jun=202023=2016:13:12=20+0200|MIME-Version:1.0|Content-Type:text/plain=3B=20charset=3Dutf-8|Content-Transfer-Encoding:8bit|References:<4344283917108237944@example.com>=0D=0A=20<3993077819152979884@gluet.ch>=0D=0A=20<3209900529850518454@example.com>|In-Reply-To:<3209900529850518454@example.com>|From:me=20<me@gluet.ch>|To:you@example.com|Subject:Re:=20=20Lunch=20=20=20today?;\r\n\
             \tl=104; bh=PurV6K1LO2FvTJaVCuWcll8LbE8in0RT2ejMpifLIA0=;\r\n\
             \tb=fLdSjVI/alC4RBoweeWzd912BhcqnIBs4iFAqcte3aQ7Y77MGPdS26SXxyfam5/M\r\n\
             \tUuzwp9GzhJPKe5rOYQHnBQ=="
    );
    assert_eq!(sig.body_length, Some(104));
    assert_eq!(sig.signed_headers.len(), 10);
}

#[tokio::test]
async fn sign_empty_body() {
    use CanonicalizationAlgorithm::*;

    let _ = tracing_subscriber::fmt::try_init();

    let headers = "From: me@example.com\nTo: you@example.com\nSubject: empty\n"
        .parse()
        .unwrap();

    let mut signer = common::make_signer("tests/keys/rsa2048.pem").await;

    let config = signer.config_mut();
    config.set_header_canonicalization(Simple);
    config.set_timestamp(Timestamp::Exact(0));

    let sig = signer.sign(&headers, b"").unwrap();

    assert_eq!(
        sig.format_header(),
        "DKIM-Signature: v=1; a=rsa-sha256; q=dns/txt; c=simple/simple; t=0; s=sel;\r\n\
             \td=example.com; h=From:To:Subject;\r\n\
             \tbh=frcCV1k9oG9oKj3dpUqdJg1PxRT2RSN/XKdLCPjaYaY=;\r\n\
             \tb=SuG0GxK1mpcK9zsaedF0rixCFIOK+m53xzdznBIFq1AwBiMxFT9ZXlKKRWhu+de0\r\n\
             \tP4DJeE75nUREGvUcb+QNLXuQ4qeymyk4YUhELyVTsE5ueGcqERCJ3weJ3y+eU2Xull2\r\n\
             \trbW53gw/1iBQkYv69iBvfmL3VZQBDxfOSS7d7DFmUZiDzjqhJuYYBtezCCwBVdm4j3n\r\n\
             \tlVI4fqnNBKs7SE0XElVW7B3GoruHcWgYv9xi3kI1+EqqpebO0N50h0K78NWm2Il/hb6\r\n\
             \tthhCRrpeTtV/oi6vcGyG+Kd9PWDUVMFUXXINwef3+l9z1a8qfjZADppk0Vqbfd5PMRc\r\n\
             \tHY+P1H6WxA=="
    );

    // trailing empty lines make no difference
    let sig2 = signer.sign(&headers, b"\r\n\r\n").unwrap();
    assert_eq!(sig2, sig);
}

#[tokio::test]
async fn sign_reader_matches_sign() {
    let headers = common::make_header_fields();
    let body = common::make_body();

    let mut signer = common::make_signer("tests/keys/rsa2048.pem").await;
    signer.config_mut().set_length_param(true);

    let sig1 = signer.sign(&headers, &body).unwrap();
    let sig2 = signer.sign_reader(&headers, Cursor::new(&body)).unwrap();

    assert_eq!(sig1, sig2);
    assert!(sig1.header_value.contains("\tl=107;"));
}

#[tokio::test]
async fn sign_missing_required_headers() {
    let headers: HeaderFields = "From: me@example.com\nDate: today\nsubject: lower case\n"
        .parse()
        .unwrap();

    let signer = common::make_signer("tests/keys/rsa2048.pem").await;

    match signer.sign(&headers, b"body\r\n") {
        Err(SignerError::MissingHeaders(names)) => assert_eq!(names, ["To", "Subject"]),
        r => panic!("unexpected result: {r:?}"),
    }
}

#[tokio::test]
async fn sign_removed_header_not_signed() {
    let headers = common::make_header_fields();
    let body = common::make_body();

    let mut signer = common::make_signer("tests/keys/rsa2048.pem").await;

    let config = signer.config_mut();
    assert!(config.remove_header_to_sign("Message-ID"));
    assert!(!config.remove_header_to_sign("Message-ID"));
    assert!(config.add_header_to_sign("Content-Disposition"));
    assert!(!config.add_header_to_sign("Content-Disposition"));

    let sig = signer.sign(&headers, &body).unwrap();

    assert_eq!(
        sig.signed_headers,
        [
            "Date",
            "MIME-Version",
            "Content-Type",
            "Content-Disposition",
            "Content-Transfer-Encoding",
            "References",
            "In-Reply-To",
            "From",
            "To",
            "Subject",
        ]
    );

    // mandatory headers cannot be opted out of
    assert!(signer.config_mut().remove_header_to_sign("To"));
    assert!(matches!(
        signer.sign(&headers, &body),
        Err(SignerError::MissingHeaders(_))
    ));
}

#[tokio::test]
async fn sign_with_mismatched_key() {
    let mut signer = common::make_signer("tests/keys/rsa2048.pem").await;

    let key = common::read_signing_key_from_file("tests/keys/ed25519.pem").await.unwrap();
    assert!(matches!(key, SigningKey::Ed25519(_)));

    assert!(signer.config_mut().set_signing_key(key).is_err());
    assert!(signer
        .config_mut()
        .set_algorithm(SignatureAlgorithm::Ed25519Sha256)
        .is_err());

    assert_eq!(signer.config().algorithm(), SignatureAlgorithm::RsaSha256);
}
