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

use mqkit_core::utils::Redact;
use mqkit_core::SigningCredential;
use std::fmt::{Debug, Formatter};

/// Credential that holds the access key pair and an optional STS token.
#[derive(Default, Clone)]
pub struct Credential {
    /// Access key id, sent in clear inside the `authorization` header.
    pub access_key_id: String,
    /// Access key secret, used as the HMAC key and never sent.
    pub access_key_secret: String,
    /// Security token for temporary (STS) credentials.
    pub security_token: Option<String>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &Redact::from(&self.access_key_id))
            .field("access_key_secret", &Redact::from(&self.access_key_secret))
            .field("security_token", &Redact::from(&self.security_token))
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        !self.access_key_id.is_empty() && !self.access_key_secret.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_validity() {
        let cred = Credential {
            access_key_id: "ak".to_string(),
            access_key_secret: "sk".to_string(),
            security_token: None,
        };
        assert!(cred.is_valid());

        let cred = Credential {
            access_key_secret: String::new(),
            ..cred
        };
        assert!(!cred.is_valid());
        assert!(!Credential::default().is_valid());
    }
}
