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
use crate::sign_request::apply_content_headers;
use crate::xml::XmlElement;
use crate::{Config, Consumer, Credential, Fault, Producer, RequestSigner, StaticCredentialProvider};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use mqkit_core::{Context, Error, ProvideCredential, Result, Signer};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::{self, Display, Formatter, Write};
use std::time::Duration;

const ERROR_ELEMENT: &str = "Error";

/// Keep RFC 3986 unreserved characters and the `||` tag separator.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'|');

/// Per call options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    timeout: Option<Duration>,
}

impl RequestOptions {
    /// Options without any override.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the whole round trip by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The configured timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Outcome of a successful call.
///
/// `code` and `request_id` are always filled from the HTTP response. `body`
/// is only present when the service answered with the expected XML
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    /// HTTP status code.
    pub code: StatusCode,
    /// Value of the `x-mq-request-id` response header.
    pub request_id: Option<String>,
    /// Decoded body.
    pub body: Option<T>,
}

impl<T> Response<T> {
    /// Convert the body, keeping code and request id.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            code: self.code,
            request_id: self.request_id,
            body: self.body.map(f),
        }
    }

    /// Convert the body with a fallible function.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<Response<U>> {
        Ok(Response {
            code: self.code,
            request_id: self.request_id,
            body: self.body.map(f).transpose()?,
        })
    }
}

/// Raw reply before result extraction.
pub(crate) struct Reply {
    pub(crate) code: StatusCode,
    pub(crate) request_id: Option<String>,
    pub(crate) document: Option<XmlElement>,
}

/// Client for one MQ endpoint.
///
/// Cloning is cheap: clones share the signer and its cached credential.
///
/// ```no_run
/// use mqkit_aliyun_mq::{Client, Config};
/// use mqkit_core::Context;
///
/// # async fn example(ctx: Context) -> mqkit_core::Result<()> {
/// let config = Config::default().from_env(&ctx);
/// let client = Client::new(ctx, config)?;
///
/// let producer = client.producer("my-topic");
/// producer.publish_message("hello", Some("tag-a")).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    endpoint: String,
    signer: Signer<Credential>,
    instance_id: Option<String>,
}

impl Client {
    /// Create a client from config.
    ///
    /// `endpoint`, `access_key_id` and `access_key_secret` are required.
    pub fn new(ctx: Context, config: Config) -> Result<Self> {
        let endpoint = required(config.endpoint.as_deref(), "endpoint")?;
        let access_key_id = required(config.access_key_id.as_deref(), "access_key_id")?;
        let access_key_secret =
            required(config.access_key_secret.as_deref(), "access_key_secret")?;

        let mut provider = StaticCredentialProvider::new(access_key_id, access_key_secret);
        if let Some(token) = config.security_token.as_deref().filter(|v| !v.is_empty()) {
            provider = provider.with_security_token(token);
        }

        let mut client = Self::with_credential_provider(ctx, endpoint, provider)?;
        client.instance_id = config.instance_id.filter(|v| !v.is_empty());
        Ok(client)
    }

    /// Create a client that loads credentials through `provider` on demand.
    pub fn with_credential_provider(
        ctx: Context,
        endpoint: &str,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        Self::with_signer(endpoint, Signer::new(ctx, provider, RequestSigner::new()))
    }

    /// Create a client around an existing signer.
    pub fn with_signer(endpoint: &str, signer: Signer<Credential>) -> Result<Self> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
            signer,
            instance_id: None,
        })
    }

    /// Set the default instance id used by producers and consumers.
    pub fn with_instance_id(mut self, instance_id: &str) -> Self {
        self.instance_id = Some(instance_id.to_string());
        self
    }

    /// The normalized endpoint, without trailing `/`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The default instance id.
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// Create a producer for `topic`.
    pub fn producer(&self, topic: &str) -> Producer {
        Producer::new(self.clone(), topic, self.instance_id.as_deref())
    }

    /// Create a consumer for `topic` under group `consumer`.
    ///
    /// `tag` filters messages by tag, several tags may be joined with `||`.
    pub fn consumer(&self, topic: &str, consumer: &str, tag: Option<&str>) -> Consumer {
        Consumer::new(
            self.clone(),
            topic,
            consumer,
            tag,
            self.instance_id.as_deref(),
        )
    }

    /// Perform a call and extract `result_element` from the response.
    ///
    /// - An `Error` document fails with a [`Fault`] wrapped in a service error.
    /// - A document whose root is `result_element` is returned as body.
    /// - Anything else yields a response without body.
    pub async fn request(
        &self,
        method: Method,
        resource: &str,
        result_element: &str,
        body: Bytes,
        options: &RequestOptions,
    ) -> Result<Response<XmlElement>> {
        let Reply {
            code,
            request_id,
            document,
        } = self.send(method, resource, body, options).await?;

        let body = match document {
            Some(doc) if doc.name() == ERROR_ELEMENT => {
                let fault = Fault::from_element(&doc, request_id.as_deref());
                log::debug!("MQ service returned fault: {fault}");
                return Err(fault.into_error());
            }
            Some(doc) if doc.name() == result_element => Some(doc),
            Some(doc) => {
                log::debug!(
                    "ignore response element {} while expecting {result_element}",
                    doc.name()
                );
                None
            }
            None => None,
        };

        Ok(Response {
            code,
            request_id,
            body,
        })
    }

    /// `GET` with an empty body.
    pub async fn get(
        &self,
        resource: &str,
        result_element: &str,
        options: &RequestOptions,
    ) -> Result<Response<XmlElement>> {
        self.request(Method::GET, resource, result_element, Bytes::new(), options)
            .await
    }

    /// `POST` with `body`.
    pub async fn post(
        &self,
        resource: &str,
        result_element: &str,
        body: Bytes,
        options: &RequestOptions,
    ) -> Result<Response<XmlElement>> {
        self.request(Method::POST, resource, result_element, body, options)
            .await
    }

    /// `DELETE` with `body`.
    pub async fn delete(
        &self,
        resource: &str,
        result_element: &str,
        body: Bytes,
        options: &RequestOptions,
    ) -> Result<Response<XmlElement>> {
        self.request(Method::DELETE, resource, result_element, body, options)
            .await
    }

    /// Sign and send one request, then parse the XML reply if there is one.
    pub(crate) async fn send(
        &self,
        method: Method,
        resource: &str,
        body: Bytes,
        options: &RequestOptions,
    ) -> Result<Reply> {
        let req = http::Request::builder()
            .method(method.clone())
            .uri(format!("{}{resource}", self.endpoint))
            .body(body)?;
        let (mut parts, body) = req.into_parts();
        apply_content_headers(&parts.method, &body, &mut parts.headers)?;
        self.signer.sign(&mut parts).await?;
        let req = http::Request::from_parts(parts, body);

        log::debug!("sending {method} {resource}");
        let ctx = self.signer.context();
        let resp = match options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, ctx.http_send(req))
                .await
                .map_err(|e| {
                    Error::unexpected(format!("{method} {resource} timed out after {timeout:?}"))
                        .with_source(e)
                })??,
            None => ctx.http_send(req).await?,
        };

        let (parts, body) = resp.into_parts();
        let code = parts.status;
        let request_id = parts
            .headers
            .get(X_MQ_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        log::debug!("{method} {resource} got {code}, request id {request_id:?}");

        let is_xml = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("xml"));
        let is_blank = body.iter().all(u8::is_ascii_whitespace);

        let document = if is_xml && !is_blank {
            let text = String::from_utf8(body.to_vec())?;
            Some(XmlElement::parse(&text)?)
        } else {
            if !code.is_success() {
                log::warn!("{method} {resource} failed with {code} and no xml error document");
            }
            None
        };

        Ok(Reply {
            code,
            request_id,
            document,
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::config_invalid(format!("{name} is required")))
}

/// Validate the endpoint and reduce it to `scheme://authority`.
fn normalize_endpoint(endpoint: &str) -> Result<String> {
    let trimmed = endpoint.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let uri: http::Uri = trimmed.parse().map_err(|e| {
        Error::config_invalid(format!("endpoint {endpoint} is not a valid url")).with_source(e)
    })?;

    let scheme = match uri.scheme_str() {
        Some(scheme @ ("http" | "https")) => scheme,
        _ => {
            return Err(Error::config_invalid(format!(
                "endpoint {endpoint} must start with http:// or https://"
            )))
        }
    };
    let Some(authority) = uri.authority() else {
        return Err(Error::config_invalid(format!(
            "endpoint {endpoint} has no host"
        )));
    };
    if uri.path_and_query().is_some_and(|pq| !matches!(pq.as_str(), "" | "/")) {
        return Err(Error::config_invalid(format!(
            "endpoint {endpoint} must not contain path or query"
        )));
    }

    Ok(format!("{scheme}://{authority}"))
}

/// Resource path with an ordered, percent encoded query.
#[derive(Debug, Clone)]
pub(crate) struct Resource {
    path: String,
    query: Vec<(&'static str, String)>,
}

impl Resource {
    /// `/topics/{topic}/messages`
    pub(crate) fn topic_messages(topic: &str) -> Self {
        Self {
            path: format!("/topics/{}/messages", percent_encode(topic)),
            query: Vec::new(),
        }
    }

    pub(crate) fn with_query(mut self, key: &'static str, value: impl Display) -> Self {
        self.query.push((key, percent_encode(&value.to_string())));
        self
    }

    pub(crate) fn with_optional_query(self, key: &'static str, value: Option<impl Display>) -> Self {
        match value {
            Some(v) => self.with_query(key, v),
            None => self,
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (idx, (k, v)) in self.query.iter().enumerate() {
            f.write_char(if idx == 0 { '?' } else { '&' })?;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ENCODE_SET).to_string()
}
