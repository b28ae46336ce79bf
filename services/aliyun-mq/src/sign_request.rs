// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use http::header::{AsHeaderName, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE};
use http::{HeaderMap, HeaderValue, Method};
use mqkit_core::hash::{base64_hmac_sha1, base64_md5};
use mqkit_core::time::{format_http_date, now, DateTime};
use mqkit_core::utils::Redact;
use mqkit_core::{Context, Error, Result, SignRequest};
use std::collections::BTreeMap;
use std::fmt::Write;

/// RequestSigner for the MQ HTTP API.
///
/// Fills in `date`, `x-mq-version`, `content-type`, the optional
/// `security-token` and finally `authorization`. Body derived headers
/// (`content-md5`, `content-length`) are expected to be set by the caller
/// before signing, see [`Client`](crate::Client).
#[derive(Debug, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer that reads the current time for every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    fn get_time(&self) -> DateTime {
        self.time.unwrap_or_else(now)
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _ctx: &Context,
        req: &mut http::request::Parts,
        credential: Option<&Self::Credential>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_invalid(
                "no valid credential available to sign MQ request",
            ));
        };

        let signing_time = self.get_time();
        req.headers
            .insert(DATE, format_http_date(signing_time).parse()?);
        req.headers
            .insert(X_MQ_VERSION, HeaderValue::from_static(MQ_VERSION));
        if !req.headers.contains_key(CONTENT_TYPE) {
            req.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_XML));
        }
        if let Some(token) = &cred.security_token {
            let mut value: HeaderValue = token.parse()?;
            value.set_sensitive(true);
            req.headers.insert(SECURITY_TOKEN, value);
        }

        let resource = req
            .uri
            .path_and_query()
            .map(|v| v.as_str())
            .unwrap_or("/");
        let signature = sign(&cred.access_key_secret, &req.method, &req.headers, resource)?;
        log::debug!(
            "signed {} {resource} with access key {}",
            req.method,
            Redact::from(&cred.access_key_id)
        );

        let mut value: HeaderValue =
            format!("{AUTH_SCHEME} {}:{signature}", cred.access_key_id).parse()?;
        value.set_sensitive(true);
        req.headers.insert(AUTHORIZATION, value);

        Ok(())
    }
}

/// Sign the canonical string of a request with `secret`.
///
/// Returns the base64 encoded HMAC-SHA1 of [`string_to_sign`].
pub fn sign(secret: &str, method: &Method, headers: &HeaderMap, resource: &str) -> Result<String> {
    let string_to_sign = string_to_sign(method, headers, resource)?;
    Ok(base64_hmac_sha1(
        secret.as_bytes(),
        string_to_sign.as_bytes(),
    ))
}

/// Build the canonical string for a request.
///
/// ```text
/// METHOD\n
/// Content-MD5\n
/// Content-Type\n
/// Date\n
/// x-mq-a:1\n
/// x-mq-b:2\n
/// /resource?query
/// ```
///
/// Missing `content-md5` or `content-type` headers contribute empty lines.
pub fn string_to_sign(method: &Method, headers: &HeaderMap, resource: &str) -> Result<String> {
    let mut s = String::new();
    writeln!(s, "{}", method.as_str())?;
    writeln!(s, "{}", header_value(headers, CONTENT_MD5)?)?;
    writeln!(s, "{}", header_value(headers, CONTENT_TYPE)?)?;
    writeln!(s, "{}", header_value(headers, DATE)?)?;
    s.write_str(&canonicalize_header(headers)?)?;
    s.write_str(resource)?;

    Ok(s)
}

fn header_value(headers: &HeaderMap, name: impl AsHeaderName) -> Result<&str> {
    match headers.get(name) {
        Some(v) => Ok(v.to_str()?),
        None => Ok(""),
    }
}

/// Service headers sorted by name, each rendered as `name:value\n`.
///
/// Repeated headers are joined with `,`.
fn canonicalize_header(headers: &HeaderMap) -> Result<String> {
    let mut canonical: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers {
        if name.as_str().starts_with(X_MQ_HEADER_PREFIX) {
            canonical
                .entry(name.as_str())
                .or_default()
                .push(value.to_str()?);
        }
    }

    let mut s = String::new();
    for (name, values) in canonical {
        writeln!(s, "{name}:{}", values.join(","))?;
    }
    Ok(s)
}

/// Set `content-md5` and `content-length` for requests that carry a body.
///
/// `GET` and `HEAD` requests are left untouched.
pub(crate) fn apply_content_headers(
    method: &Method,
    body: &[u8],
    headers: &mut HeaderMap,
) -> Result<()> {
    if method == Method::GET || method == Method::HEAD {
        return Ok(());
    }

    headers.insert(CONTENT_MD5, base64_md5(body).parse()?);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    Ok(())
}
