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

//! Signed clients for hosted message queues.
//!
//! `mqkit` bundles [`mqkit_core`] with the service crates behind cargo
//! features:
//!
//! | feature | provides |
//! |---|---|
//! | `default-context` | [`default_context`], a [`Context`] using reqwest and the process environment |
//! | `aliyun` | [`aliyun`], producer and consumer for the Aliyun MQ HTTP API |
//!
//! ```no_run
//! # #[cfg(all(feature = "default-context", feature = "aliyun"))]
//! # async fn example() -> mqkit::Result<()> {
//! let client = mqkit::aliyun::default_client()?;
//! client
//!     .producer("my-topic")
//!     .publish_message("hello", None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use mqkit_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::{default_context, default_context_with_client};

#[cfg(feature = "aliyun")]
pub mod aliyun;
