use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use mqkit_aliyun_mq::{Client, Config};
use mqkit_core::{Context, Error, HttpSend, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const ENDPOINT: &str = "http://1234567890.mqrest.cn-hangzhou.aliyuncs.com";
pub const ACCESS_KEY_ID: &str = "LTAI5tMockAccessKey";
pub const ACCESS_KEY_SECRET: &str = "mock-access-key-secret";

/// A request captured by [`MockHttpSend`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    /// Path and query as signed.
    pub fn resource(&self) -> &str {
        self.uri
            .strip_prefix(ENDPOINT)
            .expect("request must target the mock endpoint")
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).expect("body must be utf-8")
    }
}

#[derive(Debug)]
struct Canned {
    status: u16,
    content_type: Option<&'static str>,
    body: String,
}

/// HttpSend that replays canned responses in order and records every request.
///
/// Once the canned responses run out, calls fail like a broken connection.
#[derive(Debug, Clone, Default)]
pub struct MockHttpSend {
    responses: Arc<Mutex<VecDeque<Canned>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_xml(self, status: u16, body: &str) -> Self {
        self.push(Canned {
            status,
            content_type: Some("text/xml;charset=utf-8"),
            body: body.to_string(),
        })
    }

    pub fn reply_empty(self, status: u16) -> Self {
        self.push(Canned {
            status,
            content_type: None,
            body: String::new(),
        })
    }

    fn push(self, canned: Canned) -> Self {
        self.responses.lock().unwrap().push_back(canned);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests()
            .pop()
            .expect("at least one request must be sent")
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri.to_string(),
            headers: parts.headers,
            body,
        });

        let Some(canned) = self.responses.lock().unwrap().pop_front() else {
            return Err(Error::unexpected("connection reset by mock"));
        };
        let mut resp = http::Response::builder()
            .status(canned.status)
            .header("x-mq-request-id", "5F3A8C2D1E0B4A7F");
        if let Some(ct) = canned.content_type {
            resp = resp.header(CONTENT_TYPE, ct);
        }
        Ok(resp.body(Bytes::from(canned.body))?)
    }
}

/// Client wired to `mock` with static keys.
pub fn client(mock: &MockHttpSend) -> Client {
    client_with_instance(mock, None)
}

pub fn client_with_instance(mock: &MockHttpSend, instance_id: Option<&str>) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = Config {
        endpoint: Some(ENDPOINT.to_string()),
        access_key_id: Some(ACCESS_KEY_ID.to_string()),
        access_key_secret: Some(ACCESS_KEY_SECRET.to_string()),
        instance_id: instance_id.map(str::to_string),
        ..Default::default()
    };
    Client::new(Context::new().with_http_send(mock.clone()), config)
        .expect("mock config must be valid")
}

/// Check the authorization header against a locally computed signature.
pub fn assert_signed(req: &Recorded) {
    let expected = mqkit_aliyun_mq::sign(
        ACCESS_KEY_SECRET,
        &req.method,
        &req.headers,
        req.resource(),
    )
    .expect("signature must be computable");
    assert_eq!(
        req.headers["authorization"],
        format!("MQ {ACCESS_KEY_ID}:{expected}").as_str()
    );
    assert_eq!(req.headers["x-mq-version"], "2015-06-06");
    assert!(req.headers.contains_key("date"));
}
