// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Uniform envelope returned by every caller-facing operation.
///
/// Exactly one of `data` or `error_code`/`error_message` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl<T> Response<T> {
    pub fn success_with_data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_code: None,
            error_message: None,
        }
    }

    pub fn error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error_code: Some(err.code().to_string()),
            error_message: Some(err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

impl<T> From<Result<T>> for Response<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::success_with_data(data),
            Err(err) => Self::error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_envelope_carries_code_and_message_only() {
        let response: Response<u64> = Err(Error::InvalidTag("bad tag!".to_string())).into();

        assert!(response.is_failure());
        assert_eq!(
            serde_json::to_value(&response).unwrap_or_default(),
            json!({
                "success": false,
                "error_code": "invalid_tag",
                "error_message": "Invalid transaction tag: \"bad tag!\"",
            })
        );
    }

    #[test]
    fn success_envelope_carries_data_only() {
        let response: Response<u64> = Ok(7).into();

        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap_or_default(),
            json!({ "success": true, "data": 7 })
        );
    }
}
