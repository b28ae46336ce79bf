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

//! Aliyun MQ HTTP API client.
//!
//! This crate signs requests for the MQ HTTP API and wraps the publish,
//! consume and acknowledge calls behind [`Producer`] and [`Consumer`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use mqkit_aliyun_mq::{AckOutcome, Client, Config};
//! use mqkit_core::{Context, OsEnv, Result};
//! use mqkit_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let config = Config {
//!         endpoint: Some("http://1234567890.mqrest.cn-hangzhou.aliyuncs.com".to_string()),
//!         access_key_id: Some("your-access-key-id".to_string()),
//!         access_key_secret: Some("your-access-key-secret".to_string()),
//!         ..Default::default()
//!     };
//!     let client = Client::new(ctx, config)?;
//!
//!     // Publish
//!     let producer = client.producer("my-topic");
//!     let resp = producer.publish_message("hello", Some("tag-a")).await?;
//!     println!("published: {:?}", resp.body);
//!
//!     // Consume with a 3 seconds long poll, then acknowledge
//!     let consumer = client.consumer("my-topic", "GID_my_group", None);
//!     let resp = consumer.consume_message(16, Some(3)).await?;
//!     let handles: Vec<_> = resp
//!         .body
//!         .unwrap_or_default()
//!         .into_iter()
//!         .map(|m| m.receipt_handle)
//!         .collect();
//!     if !handles.is_empty() {
//!         match consumer.ack_message(&handles).await? {
//!             AckOutcome::AllAcked { .. } => {}
//!             AckOutcome::PartiallyFailed { errors, .. } => eprintln!("ack failed: {errors:?}"),
//!             AckOutcome::TotallyFailed(fault) => eprintln!("ack rejected: {fault}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! ### Environment Variables
//!
//! ```bash
//! export ALIBABA_CLOUD_MQ_ENDPOINT=http://1234567890.mqrest.cn-hangzhou.aliyuncs.com
//! export ALIBABA_CLOUD_ACCESS_KEY_ID=your-access-key-id
//! export ALIBABA_CLOUD_ACCESS_KEY_SECRET=your-access-key-secret
//! export ALIBABA_CLOUD_SECURITY_TOKEN=your-sts-token  # Optional, for STS
//! export ALIBABA_CLOUD_MQ_INSTANCE_ID=MQ_INST_xxx    # Optional
//! ```
//!
//! Use [`Config::from_env`] to pick them up, or hand a
//! [`DefaultCredentialProvider`] to [`Client::with_credential_provider`] to
//! resolve keys lazily.
//!
//! ## Errors
//!
//! Service error documents are returned as [`mqkit_core::Error`] of kind
//! `Service`; [`Fault::from_error`] gives back the code, message, request id
//! and host id reported by the service.

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod sign_request;
pub use sign_request::{sign, string_to_sign, RequestSigner};

mod provide_credential;
pub use provide_credential::*;

mod error;
pub use error::Fault;

mod xml;
pub use xml::{Fields, XmlElement, XmlText};

mod client;
pub use client::{Client, RequestOptions, Response};

mod producer;
pub use producer::{MessageProperties, Producer, PublishResult};

mod consumer;
pub use consumer::{AckError, AckOutcome, Consumer, Message};
