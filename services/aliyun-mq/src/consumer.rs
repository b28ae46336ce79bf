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

use crate::client::Resource;
use crate::constants::*;
use crate::producer::parse_properties;
use crate::xml::XmlElement;
use crate::{Client, Fault, RequestOptions, Response};
use bytes::Bytes;
use http::StatusCode;
use mqkit_core::time::{from_timestamp_millis, DateTime};
use mqkit_core::{Error, Result};
use std::collections::BTreeMap;

const MESSAGES_ELEMENT: &str = "Messages";
const MESSAGE_ELEMENT: &str = "Message";
const ERRORS_ELEMENT: &str = "Errors";
const ERROR_ELEMENT: &str = "Error";
const RECEIPT_HANDLES_ELEMENT: &str = "ReceiptHandles";
const RECEIPT_HANDLE_ELEMENT: &str = "ReceiptHandle";

/// Consumer pulls and acknowledges messages of one topic for one consumer group.
///
/// Calls default to a timeout of 35 seconds so that long polling with the
/// maximum wait of 30 seconds can complete.
#[derive(Debug, Clone)]
pub struct Consumer {
    client: Client,
    topic: String,
    consumer: String,
    tag: Option<String>,
    instance_id: Option<String>,
    options: RequestOptions,
}

impl Consumer {
    /// Create a consumer.
    pub fn new(
        client: Client,
        topic: &str,
        consumer: &str,
        tag: Option<&str>,
        instance_id: Option<&str>,
    ) -> Self {
        Self {
            client,
            topic: topic.to_string(),
            consumer: consumer.to_string(),
            tag: tag.map(str::to_string),
            instance_id: instance_id.map(str::to_string),
            options: RequestOptions::new().with_timeout(LONG_POLL_TIMEOUT),
        }
    }

    /// Replace the options applied to every call.
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// The topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The consumer group.
    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    /// The tag filter.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Pull up to `num_of_messages` messages.
    ///
    /// With `wait_seconds` the service holds the request until a message
    /// arrives or the wait elapses. No message ready is not an error: the
    /// body is then an empty list.
    ///
    /// A `Message` record that cannot be decoded is logged and skipped, so
    /// the rest of the batch can still be acknowledged.
    pub async fn consume_message(
        &self,
        num_of_messages: u32,
        wait_seconds: Option<u32>,
    ) -> Result<Response<Vec<Message>>> {
        let resource = Resource::topic_messages(&self.topic)
            .with_query("consumer", &self.consumer)
            .with_optional_query("tag", self.tag.as_deref())
            .with_query("numOfMessages", num_of_messages)
            .with_optional_query("waitseconds", wait_seconds)
            .with_optional_query("ns", self.instance_id.as_deref());

        let resp = self
            .client
            .get(&resource.to_string(), MESSAGES_ELEMENT, &self.options)
            .await?;
        Ok(resp.map(|messages| {
            messages
                .children_named(MESSAGE_ELEMENT)
                .filter_map(|element| match Message::try_from(element) {
                    Ok(message) => Some(message),
                    Err(err) => {
                        log::warn!("skip malformed message in consume response: {err}");
                        None
                    }
                })
                .collect()
        }))
    }

    /// Acknowledge consumed messages by receipt handle.
    ///
    /// The service may accept some handles and reject others, so the three
    /// outcomes are reported through [`AckOutcome`]. Only transport and
    /// parse failures are returned as `Err`.
    ///
    /// A service fault is returned as [`AckOutcome::TotallyFailed`], not as
    /// `Err`. Callers must match on the outcome, or call
    /// [`AckOutcome::into_result`] to raise the fault with `?`.
    pub async fn ack_message<S: AsRef<str>>(&self, receipt_handles: &[S]) -> Result<AckOutcome> {
        if receipt_handles.is_empty() {
            return Err(Error::request_invalid(
                "at least one receipt handle is required",
            ));
        }

        let mut document =
            XmlElement::new(RECEIPT_HANDLES_ELEMENT).with_attribute("xmlns", XML_NAMESPACE);
        for handle in receipt_handles {
            document = document.with_child(XmlElement::leaf(RECEIPT_HANDLE_ELEMENT, handle.as_ref()));
        }
        let resource = Resource::topic_messages(&self.topic)
            .with_query("consumer", &self.consumer)
            .with_optional_query("ns", self.instance_id.as_deref());

        let resp = self
            .client
            .delete(
                &resource.to_string(),
                ERRORS_ELEMENT,
                Bytes::from(document.to_xml()?),
                &self.options,
            )
            .await;
        let Response {
            code,
            request_id,
            body,
        } = match resp {
            Ok(resp) => resp,
            Err(err) => {
                return match Fault::from_error(&err) {
                    Some(fault) => Ok(AckOutcome::TotallyFailed(fault.clone())),
                    None => Err(err),
                }
            }
        };

        let errors: Vec<AckError> = body
            .iter()
            .flat_map(|errors| errors.children_named(ERROR_ELEMENT))
            .map(AckError::from)
            .collect();
        if errors.is_empty() {
            Ok(AckOutcome::AllAcked { code, request_id })
        } else {
            log::debug!(
                "{} of {} receipt handles failed to ack",
                errors.len(),
                receipt_handles.len()
            );
            Ok(AckOutcome::PartiallyFailed {
                code,
                request_id,
                errors,
            })
        }
    }
}

/// A consumed message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Message id.
    pub message_id: String,
    /// Handle used to acknowledge this delivery.
    pub receipt_handle: String,
    /// Message body.
    pub message_body: String,
    /// MD5 of the body.
    pub message_body_md5: String,
    /// Tag, if the message has one.
    pub message_tag: Option<String>,
    /// Time the message was published.
    pub publish_time: Option<DateTime>,
    /// Time the message was first delivered.
    pub first_consume_time: Option<DateTime>,
    /// Time the message becomes visible again unless acknowledged.
    pub next_consume_time: Option<DateTime>,
    /// Number of deliveries so far.
    pub consumed_times: u32,
    /// System and user properties.
    pub properties: BTreeMap<String, String>,
}

impl Message {
    /// Business key set by the producer.
    pub fn message_key(&self) -> Option<&str> {
        self.properties.get(PROPERTY_KEYS).map(String::as_str)
    }

    /// Requested delivery time for timed messages.
    pub fn start_deliver_time(&self) -> Option<DateTime> {
        let ms = self.properties.get(PROPERTY_START_DELIVER_TIME)?;
        from_timestamp_millis(ms.parse().ok()?).ok()
    }

    /// Sharding key for ordered messages.
    pub fn sharding_key(&self) -> Option<&str> {
        self.properties
            .get(PROPERTY_SHARDING_KEY)
            .map(String::as_str)
    }
}

impl TryFrom<&XmlElement> for Message {
    type Error = Error;

    fn try_from(element: &XmlElement) -> Result<Self> {
        let fields = element.fields();
        let time = |name: &str| -> Result<Option<DateTime>> {
            fields
                .parse::<i64>(name)?
                .map(from_timestamp_millis)
                .transpose()
        };

        Ok(Self {
            message_id: fields.require("MessageId")?.to_string(),
            receipt_handle: fields.require("ReceiptHandle")?.to_string(),
            message_body: fields.get("MessageBody").unwrap_or_default().to_string(),
            message_body_md5: fields.get("MessageBodyMD5").unwrap_or_default().to_string(),
            message_tag: fields
                .get("MessageTag")
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            publish_time: time("PublishTime")?,
            first_consume_time: time("FirstConsumeTime")?,
            next_consume_time: time("NextConsumeTime")?,
            consumed_times: fields.parse("ConsumedTimes")?.unwrap_or_default(),
            properties: fields
                .get("Properties")
                .map(parse_properties)
                .unwrap_or_default(),
        })
    }
}

/// A receipt handle the service refused to acknowledge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckError {
    /// Error code, e.g. `ReceiptHandleError`.
    pub error_code: String,
    /// Human readable message.
    pub error_message: String,
    /// The rejected handle.
    pub receipt_handle: String,
}

impl From<&XmlElement> for AckError {
    fn from(element: &XmlElement) -> Self {
        let fields = element.fields();
        let get = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| fields.get(name))
                .unwrap_or_default()
                .to_string()
        };

        Self {
            error_code: get(&["ErrorCode", "Code"]),
            error_message: get(&["ErrorMessage", "Message"]),
            receipt_handle: get(&["ReceiptHandle"]),
        }
    }
}

/// Result of [`Consumer::ack_message`].
#[must_use = "a failed acknowledgment is only reported through the outcome"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    /// Every handle was acknowledged.
    AllAcked {
        /// HTTP status code.
        code: StatusCode,
        /// Request id of the call.
        request_id: Option<String>,
    },
    /// The call succeeded but some handles were rejected.
    PartiallyFailed {
        /// HTTP status code.
        code: StatusCode,
        /// Request id of the call.
        request_id: Option<String>,
        /// One entry per rejected handle.
        errors: Vec<AckError>,
    },
    /// The service rejected the whole call.
    TotallyFailed(Fault),
}

impl AckOutcome {
    /// Check if every handle was acknowledged.
    pub fn is_all_acked(&self) -> bool {
        matches!(self, AckOutcome::AllAcked { .. })
    }

    /// Raise a total failure as its [`Fault`] error.
    ///
    /// Partial failures are kept, their errors are still in the outcome.
    pub fn into_result(self) -> Result<Self> {
        match self {
            AckOutcome::TotallyFailed(fault) => Err(fault.into_error()),
            outcome => Ok(outcome),
        }
    }

    /// Per handle failures, empty unless partially failed.
    pub fn errors(&self) -> &[AckError] {
        match self {
            AckOutcome::PartiallyFailed { errors, .. } => errors,
            _ => &[],
        }
    }
}
