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

use crate::xml::XmlElement;
use mqkit_core::Error;

const MESSAGE_NOT_EXIST: &str = "MessageNotExist";

/// Error document returned by the MQ service.
///
/// Failed calls surface as [`mqkit_core::Error`] of kind
/// [`Service`](mqkit_core::ErrorKind::Service); use [`Fault::from_error`] to
/// get the typed document back.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message} (request id: {request_id}, host id: {host_id})")]
pub struct Fault {
    /// Service error code, e.g. `TopicNotExist`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Request id reported by the service.
    pub request_id: String,
    /// Host that served the request.
    pub host_id: String,
}

impl Fault {
    /// Build from an `Error` element.
    ///
    /// `fallback_request_id` (the `x-mq-request-id` header) is used when the
    /// document omits `RequestId`.
    pub(crate) fn from_element(element: &XmlElement, fallback_request_id: Option<&str>) -> Self {
        let fields = element.fields();
        let get = |name: &str| fields.get(name).unwrap_or_default().to_string();

        let mut request_id = get("RequestId");
        if request_id.is_empty() {
            request_id = fallback_request_id.unwrap_or_default().to_string();
        }

        Self {
            code: get("Code"),
            message: get("Message"),
            request_id,
            host_id: get("HostId"),
        }
    }

    /// Wrap into a service error.
    pub fn into_error(self) -> Error {
        Error::service(format!("MQ service returned {}", self.code)).with_source(self)
    }

    /// Get the fault carried by `err`, if it is one.
    pub fn from_error(err: &Error) -> Option<&Fault> {
        err.downcast_source::<Fault>()
    }

    /// Check if the service reported that no message is available.
    ///
    /// Consuming from an empty topic may answer with this code instead of an
    /// empty `Messages` document.
    pub fn is_message_not_exist(&self) -> bool {
        self.code == MESSAGE_NOT_EXIST
    }
}
