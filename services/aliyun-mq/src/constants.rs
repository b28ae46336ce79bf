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

use std::time::Duration;

// Env values used by the MQ client.
pub const ALIBABA_CLOUD_MQ_ENDPOINT: &str = "ALIBABA_CLOUD_MQ_ENDPOINT";
pub const ALIBABA_CLOUD_ACCESS_KEY_ID: &str = "ALIBABA_CLOUD_ACCESS_KEY_ID";
pub const ALIBABA_CLOUD_ACCESS_KEY_SECRET: &str = "ALIBABA_CLOUD_ACCESS_KEY_SECRET";
pub const ALIBABA_CLOUD_SECURITY_TOKEN: &str = "ALIBABA_CLOUD_SECURITY_TOKEN";
pub const ALIBABA_CLOUD_MQ_INSTANCE_ID: &str = "ALIBABA_CLOUD_MQ_INSTANCE_ID";

// Headers
pub const X_MQ_VERSION: &str = "x-mq-version";
pub const X_MQ_REQUEST_ID: &str = "x-mq-request-id";
pub const X_MQ_HEADER_PREFIX: &str = "x-mq-";
pub const SECURITY_TOKEN: &str = "security-token";
pub const CONTENT_MD5: &str = "content-md5";

// Protocol
pub const MQ_VERSION: &str = "2015-06-06";
pub const AUTH_SCHEME: &str = "MQ";
pub const CONTENT_TYPE_XML: &str = "text/xml;charset=utf-8";
pub const XML_NAMESPACE: &str = "http://mq.aliyuncs.com/doc/v1/";

// Server side long polling waits at most 30 seconds.
pub const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(35);

// Reserved message property names.
pub const PROPERTY_KEYS: &str = "KEYS";
pub const PROPERTY_START_DELIVER_TIME: &str = "__STARTDELIVERTIME";
pub const PROPERTY_SHARDING_KEY: &str = "__SHARDINGKEY";
