//! Shared Key request authorization.
//!
//! Container creation cannot be authorized by a container SAS, so the
//! create-if-absent call signs with the account key directly.

use std::fmt::Write;

use http::header::*;
use http::request::Parts;
use log::debug;

use crate::constants::*;
use crate::hash::{base64_decode, base64_hmac_sha256};
use crate::time::{format_http_date, DateTime};
use crate::{Credential, Result};

/// Sign a request with Azure Storage Shared Key Authorization.
///
/// - [Authorize with Shared Key](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
///
/// Sets the `x-ms-date` header from `now` and attaches the `Authorization`
/// header; everything else about the request is left untouched.
pub(crate) fn sign_shared_key(parts: &mut Parts, cred: &Credential, now: DateTime) -> Result<()> {
    parts
        .headers
        .insert(X_MS_DATE, format_http_date(now).parse()?);

    let string_to_sign = string_to_sign(parts, &cred.account_name)?;
    let decode_content = base64_decode(&cred.account_key)?;
    let signature = base64_hmac_sha256(&decode_content, string_to_sign.as_bytes());

    parts.headers.insert(AUTHORIZATION, {
        let mut value: HeaderValue =
            format!("SharedKey {}:{}", cred.account_name, signature).parse()?;
        value.set_sensitive(true);

        value
    });

    Ok(())
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// VERB + "\n" +
/// Content-Encoding + "\n" +
/// Content-Language + "\n" +
/// Content-Length + "\n" +
/// Content-MD5 + "\n" +
/// Content-Type + "\n" +
/// Date + "\n" +
/// If-Modified-Since + "\n" +
/// If-Match + "\n" +
/// If-None-Match + "\n" +
/// If-Unmodified-Since + "\n" +
/// Range + "\n" +
/// CanonicalizedHeaders +
/// CanonicalizedResource;
/// ```
///
/// ## Reference
///
/// - [Blob, Queue, and File Services (Shared Key authorization)](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key)
fn string_to_sign(parts: &Parts, account: &str) -> Result<String> {
    let mut s = String::with_capacity(128);

    writeln!(&mut s, "{}", parts.method.as_str())?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &CONTENT_ENCODING)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &CONTENT_LANGUAGE)?)?;
    writeln!(
        &mut s,
        "{}",
        header_get_or_default(parts, &CONTENT_LENGTH)
            .map(|v| if v == "0" { "" } else { v })?
    )?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &HeaderName::from_static("content-md5"))?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &CONTENT_TYPE)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &DATE)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &IF_MODIFIED_SINCE)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &IF_MATCH)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &IF_NONE_MATCH)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &IF_UNMODIFIED_SINCE)?)?;
    writeln!(&mut s, "{}", header_get_or_default(parts, &RANGE)?)?;
    writeln!(&mut s, "{}", canonicalized_headers(parts)?)?;
    write!(&mut s, "{}", canonicalized_resource(parts, account)?)?;

    debug!("string to sign: {}", &s);

    Ok(s)
}

fn header_get_or_default<'a>(parts: &'a Parts, name: &HeaderName) -> Result<&'a str> {
    match parts.headers.get(name) {
        Some(v) => Ok(v.to_str()?),
        None => Ok(""),
    }
}

/// ## Reference
///
/// - [Constructing the canonicalized headers string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-headers-string)
fn canonicalized_headers(parts: &Parts) -> Result<String> {
    let mut headers = Vec::new();
    for (k, v) in parts.headers.iter() {
        if k.as_str().starts_with("x-ms-") {
            headers.push((k.as_str(), v.to_str()?.trim()));
        }
    }
    headers.sort();

    Ok(headers
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// ## Reference
///
/// - [Constructing the canonicalized resource string](https://docs.microsoft.com/en-us/rest/api/storageservices/authorize-with-shared-key#constructing-the-canonicalized-resource-string)
fn canonicalized_resource(parts: &Parts, account: &str) -> Result<String> {
    let path = parts.uri.path();

    let mut query: Vec<(String, String)> = parts
        .uri
        .query()
        .map(|v| {
            form_urlencoded::parse(v.as_bytes())
                .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
                .collect()
        })
        .unwrap_or_default();

    if query.is_empty() {
        return Ok(format!("/{account}{path}"));
    }

    query.sort();
    let query = query
        .iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!("/{account}{path}\n{query}"))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use http::Request;

    fn test_credential() -> Credential {
        Credential {
            account_name: "testaccount".to_string(),
            account_key: crate::hash::base64_encode(b"key"),
        }
    }

    #[test]
    fn test_sign_container_create() {
        let _ = env_logger::builder().is_test(true).try_init();

        let req = Request::builder()
            .method(http::Method::PUT)
            .uri("https://testaccount.blob.core.windows.net/foodimages?restype=container")
            .header(X_MS_VERSION, AZURE_VERSION)
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let now = DateTime::from_str("2022-03-01T08:12:34Z").unwrap();
        sign_shared_key(&mut parts, &test_credential(), now).unwrap();

        assert_eq!(
            parts.headers.get(X_MS_DATE).unwrap(),
            "Tue, 01 Mar 2022 08:12:34 GMT"
        );
        assert_eq!(
            parts.headers.get(AUTHORIZATION).unwrap(),
            "SharedKey testaccount:hj662hTGA02zs2Ma3dHdliokE/uQWn3tA0vYrdHbxZI="
        );
    }

    #[test]
    fn test_canonicalized_resource_without_query() {
        let req = Request::builder()
            .method(http::Method::PUT)
            .uri("https://testaccount.blob.core.windows.net/foodimages/blob.jpg")
            .body(())
            .unwrap();
        let (parts, _) = req.into_parts();

        assert_eq!(
            canonicalized_resource(&parts, "testaccount").unwrap(),
            "/testaccount/foodimages/blob.jpg"
        );
    }
}
