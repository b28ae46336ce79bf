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
use mqkit_core::utils::Redact;
use mqkit_core::Context;
use std::fmt::{Debug, Formatter};

/// Config carries everything needed to construct a [`Client`](crate::Client).
#[derive(Clone, Default)]
pub struct Config {
    /// `endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_MQ_ENDPOINT`]
    ///
    /// Looks like `http://1234567890.mqrest.cn-hangzhou.aliyuncs.com`.
    pub endpoint: Option<String>,
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `access_key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_SECRET`]
    pub access_key_secret: Option<String>,
    /// `security_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_SECURITY_TOKEN`]
    pub security_token: Option<String>,
    /// `instance_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_MQ_INSTANCE_ID`]
    ///
    /// Producers and consumers created from the client use it as their namespace.
    pub instance_id: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("access_key_secret", &Redact::from(&self.access_key_secret))
            .field("security_token", &Redact::from(&self.security_token))
            .field("instance_id", &self.instance_id)
            .finish()
    }
}

impl Config {
    /// Load config from env.
    ///
    /// Fields that are already set are left untouched.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_MQ_ENDPOINT) {
            self.endpoint.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_ID) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_ACCESS_KEY_SECRET) {
            self.access_key_secret.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_SECURITY_TOKEN) {
            self.security_token.get_or_insert(v);
        }
        if let Some(v) = ctx.env_var(ALIBABA_CLOUD_MQ_INSTANCE_ID) {
            self.instance_id.get_or_insert(v);
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqkit_core::StaticEnv;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_env() {
        let ctx = Context::new().with_env(StaticEnv {
            envs: HashMap::from([
                (
                    ALIBABA_CLOUD_MQ_ENDPOINT.to_string(),
                    "http://123.mqrest.cn-hangzhou.aliyuncs.com".to_string(),
                ),
                (ALIBABA_CLOUD_ACCESS_KEY_ID.to_string(), "env_ak".to_string()),
                (ALIBABA_CLOUD_ACCESS_KEY_SECRET.to_string(), "env_sk".to_string()),
                (ALIBABA_CLOUD_MQ_INSTANCE_ID.to_string(), "MQ_INST_1".to_string()),
            ]),
        });

        let config = Config {
            access_key_id: Some("explicit_ak".to_string()),
            ..Default::default()
        }
        .from_env(&ctx);

        assert_eq!(
            config.endpoint.as_deref(),
            Some("http://123.mqrest.cn-hangzhou.aliyuncs.com")
        );
        // Explicit values win over env.
        assert_eq!(config.access_key_id.as_deref(), Some("explicit_ak"));
        assert_eq!(config.access_key_secret.as_deref(), Some("env_sk"));
        assert_eq!(config.security_token, None);
        assert_eq!(config.instance_id.as_deref(), Some("MQ_INST_1"));
    }

    #[test]
    fn test_config_debug_is_redacted() {
        let config = Config {
            access_key_secret: Some("a-very-secret-access-key".to_string()),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("a-very-secret-access-key"));
        assert!(printed.contains("a-v***key"));
    }
}
