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

use crate::provide_credential::{EnvCredentialProvider, StaticCredentialProvider};
use crate::{Config, Credential};
use async_trait::async_trait;
use mqkit_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// DefaultCredentialProvider tries the usual credential sources in order.
///
/// Resolution order:
///
/// 1. Keys set explicitly in [`Config`] (when built with [`Self::from_config`])
/// 2. Environment variables
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new `DefaultCredentialProvider` reading from the environment only.
    pub fn new() -> Self {
        let chain = ProvideCredentialChain::new().push(EnvCredentialProvider::new());

        Self { chain }
    }

    /// Create a provider that prefers the keys carried by `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut provider = Self::new();
        if let (Some(ak), Some(sk)) = (&config.access_key_id, &config.access_key_secret) {
            let mut static_provider = StaticCredentialProvider::new(ak, sk);
            if let Some(token) = &config.security_token {
                static_provider = static_provider.with_security_token(token);
            }
            provider = provider.push_front(static_provider);
        }
        provider
    }

    /// Create with a custom credential chain.
    pub fn with_chain(chain: ProvideCredentialChain<Credential>) -> Self {
        Self { chain }
    }

    /// Add a credential provider to the front of the default chain.
    ///
    /// ```no_run
    /// use mqkit_aliyun_mq::{DefaultCredentialProvider, StaticCredentialProvider};
    ///
    /// let provider = DefaultCredentialProvider::new()
    ///     .push_front(StaticCredentialProvider::new("access_key", "secret_key"));
    /// ```
    pub fn push_front(mut self, provider: impl ProvideCredential<Credential = Credential>) -> Self {
        self.chain = self.chain.push_front(provider);
        self
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use mqkit_core::StaticEnv;
    use std::collections::HashMap;

    fn env_ctx() -> Context {
        Context::new().with_env(StaticEnv {
            envs: HashMap::from([
                (ALIBABA_CLOUD_ACCESS_KEY_ID.to_string(), "env_ak".to_string()),
                (
                    ALIBABA_CLOUD_ACCESS_KEY_SECRET.to_string(),
                    "env_sk".to_string(),
                ),
            ]),
        })
    }

    #[tokio::test]
    async fn test_default_loader_without_env() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let cred = DefaultCredentialProvider::new()
            .provide_credential(&Context::new())
            .await?;
        assert!(cred.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_default_loader_with_env() -> Result<()> {
        let cred = DefaultCredentialProvider::new()
            .provide_credential(&env_ctx())
            .await?
            .expect("credential must be loaded from env");
        assert_eq!(cred.access_key_id, "env_ak");
        assert_eq!(cred.access_key_secret, "env_sk");
        Ok(())
    }

    #[tokio::test]
    async fn test_default_loader_prefers_config() -> Result<()> {
        let config = Config {
            access_key_id: Some("config_ak".to_string()),
            access_key_secret: Some("config_sk".to_string()),
            security_token: Some("config_token".to_string()),
            ..Default::default()
        };

        let cred = DefaultCredentialProvider::from_config(&config)
            .provide_credential(&env_ctx())
            .await?
            .expect("credential must be loaded from config");
        assert_eq!(cred.access_key_id, "config_ak");
        assert_eq!(cred.security_token.as_deref(), Some("config_token"));
        Ok(())
    }

    #[tokio::test]
    async fn test_default_loader_with_chain() -> Result<()> {
        let chain = ProvideCredentialChain::new()
            .push(StaticCredentialProvider::new("chain_ak", "chain_sk"))
            .push(EnvCredentialProvider::new());

        let cred = DefaultCredentialProvider::with_chain(chain)
            .provide_credential(&env_ctx())
            .await?
            .expect("credential must be loaded from chain");
        assert_eq!(cred.access_key_id, "chain_ak");
        assert_eq!(cred.access_key_secret, "chain_sk");
        Ok(())
    }
}
