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
use crate::xml::{Fields, XmlElement};
use crate::{Client, RequestOptions, Response};
use bytes::Bytes;
use mqkit_core::time::DateTime;
use mqkit_core::{Error, Result};
use std::collections::BTreeMap;

const MESSAGE_ELEMENT: &str = "Message";

/// Producer publishes messages to a single topic.
#[derive(Debug, Clone)]
pub struct Producer {
    client: Client,
    topic: String,
    instance_id: Option<String>,
    options: RequestOptions,
}

impl Producer {
    /// Create a producer for `topic`, optionally inside instance `instance_id`.
    pub fn new(client: Client, topic: &str, instance_id: Option<&str>) -> Self {
        Self {
            client,
            topic: topic.to_string(),
            instance_id: instance_id.map(str::to_string),
            options: RequestOptions::default(),
        }
    }

    /// Options applied to every publish call.
    pub fn with_request_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// The topic this producer publishes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The instance id, if any.
    pub fn instance_id(&self) -> Option<&str> {
        self.instance_id.as_deref()
    }

    /// Publish one message with an optional tag.
    pub async fn publish_message(
        &self,
        body: &str,
        tag: Option<&str>,
    ) -> Result<Response<PublishResult>> {
        self.publish_message_with_properties(body, tag, &MessageProperties::default())
            .await
    }

    /// Publish one message carrying `properties`.
    pub async fn publish_message_with_properties(
        &self,
        body: &str,
        tag: Option<&str>,
        properties: &MessageProperties,
    ) -> Result<Response<PublishResult>> {
        let document = message_document(body, tag, properties)?.to_xml()?;
        let resource = Resource::topic_messages(&self.topic)
            .with_optional_query("ns", self.instance_id.as_deref());

        let resp = self
            .client
            .post(
                &resource.to_string(),
                MESSAGE_ELEMENT,
                Bytes::from(document),
                &self.options,
            )
            .await?;
        resp.try_map(|element| PublishResult::try_from(element.fields()))
    }
}

/// Build the `Message` document sent on publish.
pub(crate) fn message_document(
    body: &str,
    tag: Option<&str>,
    properties: &MessageProperties,
) -> Result<XmlElement> {
    let mut message = XmlElement::new(MESSAGE_ELEMENT)
        .with_attribute("xmlns", XML_NAMESPACE)
        .with_child(XmlElement::leaf("MessageBody", body));
    if let Some(tag) = tag {
        message = message.with_child(XmlElement::leaf("MessageTag", tag));
    }
    if !properties.is_empty() {
        message = message.with_child(XmlElement::leaf("Properties", properties.encode()?));
    }
    Ok(message)
}

/// Result of a successful publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishResult {
    /// Id assigned by the service.
    pub message_id: String,
    /// MD5 of the message body as computed by the service.
    pub message_body_md5: String,
}

impl TryFrom<Fields> for PublishResult {
    type Error = Error;

    fn try_from(fields: Fields) -> Result<Self> {
        Ok(Self {
            message_id: fields.require("MessageId")?.to_string(),
            message_body_md5: fields.get("MessageBodyMD5").unwrap_or_default().to_string(),
        })
    }
}

/// Properties attached to a published message.
///
/// ```
/// use mqkit_aliyun_mq::MessageProperties;
///
/// let properties = MessageProperties::new()
///     .with_message_key("order-42")
///     .with_property("region", "hz");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageProperties {
    message_key: Option<String>,
    start_deliver_time: Option<i64>,
    sharding_key: Option<String>,
    properties: BTreeMap<String, String>,
}

impl MessageProperties {
    /// Empty properties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Business key of the message, searchable in the console.
    pub fn with_message_key(mut self, key: &str) -> Self {
        self.message_key = Some(key.to_string());
        self
    }

    /// Deliver the message no earlier than `time`.
    pub fn with_start_deliver_time(mut self, time: DateTime) -> Self {
        self.start_deliver_time = Some(time.timestamp_millis());
        self
    }

    /// Sharding key for ordered topics.
    pub fn with_sharding_key(mut self, key: &str) -> Self {
        self.sharding_key = Some(key.to_string());
        self
    }

    /// Add a user defined property.
    ///
    /// `KEYS`, `__STARTDELIVERTIME` and `__SHARDINGKEY` belong to the typed
    /// setters and are rejected when the message is published.
    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_string(), value.to_string());
        self
    }

    /// Check if no property is set.
    pub fn is_empty(&self) -> bool {
        self.message_key.is_none()
            && self.start_deliver_time.is_none()
            && self.sharding_key.is_none()
            && self.properties.is_empty()
    }

    /// Encode as `name:value|` pairs.
    fn encode(&self) -> Result<String> {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(key) = &self.message_key {
            pairs.push((PROPERTY_KEYS, key.clone()));
        }
        if let Some(time) = self.start_deliver_time {
            pairs.push((PROPERTY_START_DELIVER_TIME, time.to_string()));
        }
        if let Some(key) = &self.sharding_key {
            pairs.push((PROPERTY_SHARDING_KEY, key.clone()));
        }
        for (name, value) in &self.properties {
            if SYSTEM_PROPERTIES.contains(&name.as_str()) {
                return Err(Error::request_invalid(format!(
                    "message property {name} is reserved, use its typed setter instead"
                )));
            }
            pairs.push((name.as_str(), value.clone()));
        }

        let mut s = String::new();
        for (name, value) in pairs {
            if is_reserved(name) || is_reserved(&value) {
                return Err(Error::request_invalid(format!(
                    "message property {name} must not contain ':' or '|'"
                )));
            }
            s.push_str(name);
            s.push(':');
            s.push_str(&value);
            s.push('|');
        }
        Ok(s)
    }
}

const SYSTEM_PROPERTIES: [&str; 3] = [
    PROPERTY_KEYS,
    PROPERTY_START_DELIVER_TIME,
    PROPERTY_SHARDING_KEY,
];

fn is_reserved(s: &str) -> bool {
    s.contains([':', '|'])
}

/// Parse `name:value|` pairs. Malformed pairs are skipped.
pub(crate) fn parse_properties(s: &str) -> BTreeMap<String, String> {
    s.split('|')
        .filter_map(|pair| pair.split_once(':'))
        .filter(|(name, _)| !name.is_empty())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
