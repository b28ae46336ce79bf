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

//! Aliyun MQ support with convenience constructors.

pub use mqkit_aliyun_mq::*;

#[cfg(feature = "default-context")]
use crate::{default_context, Result};

/// Create a client configured entirely from the environment.
///
/// Reads `ALIBABA_CLOUD_MQ_ENDPOINT`, `ALIBABA_CLOUD_ACCESS_KEY_ID`,
/// `ALIBABA_CLOUD_ACCESS_KEY_SECRET` and the optional
/// `ALIBABA_CLOUD_SECURITY_TOKEN` and `ALIBABA_CLOUD_MQ_INSTANCE_ID`.
///
/// # Example
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> mqkit::Result<()> {
/// let client = mqkit::aliyun::default_client()?;
/// let consumer = client.consumer("my-topic", "GID_my_group", Some("tag-a"));
/// let resp = consumer.consume_message(16, Some(3)).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "default-context")]
pub fn default_client() -> Result<Client> {
    default_client_with_config(Config::default())
}

/// Create a client from `config`, filling unset fields from the environment.
#[cfg(feature = "default-context")]
pub fn default_client_with_config(config: Config) -> Result<Client> {
    let ctx = default_context();
    let config = config.from_env(&ctx);
    Client::new(ctx, config)
}
