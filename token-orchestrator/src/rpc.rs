// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Calldata, Hash, TxHash, U256};
use alloy::transports::TransportErrorKind;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use secrecy::{ExposeSecret, Secret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Capacity of a submission event stream. A submission yields at most two events.
pub const SUBMISSION_EVENTS_CAPACITY: usize = 2;

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] alloy::transports::RpcError<TransportErrorKind>),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
    #[error("Could not decode the returned data: {0}")]
    Decode(String),
}

/// The private key that signs one transaction. It is consumed by the send and never retained.
pub struct Credential(SecretString);

impl Credential {
    pub fn new(private_key: impl Into<String>) -> Self {
        Self(Secret::new(private_key.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionParams {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub gas_price: u128,
    pub gas_limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Calldata>,
}

/// The node's record of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_hash: Option<Hash>,
    pub block_number: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    pub gas_used: u128,
    pub effective_gas_price: u128,
    pub status: bool,
}

/// Why a submission stopped short of a receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Waiting for the receipt gave up. The transaction may still be mined later.
    PendingConfirmationTimeout { detail: String },
    Rejected { detail: String },
}

impl std::fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionError::PendingConfirmationTimeout { detail } => {
                write!(f, "transaction was not confirmed in time: {detail}")
            }
            SubmissionError::Rejected { detail } => write!(f, "{detail}"),
        }
    }
}

/// Signals relayed by the node for a single `send_transaction` call, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionEvent {
    Submitted(TxHash),
    Confirmed(Receipt),
    Failed(SubmissionError),
}

pub type SubmissionEvents = mpsc::Receiver<SubmissionEvent>;

/// Remote calls against the chain node hosting the token contract.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256, RpcError>;

    async fn get_gas_price(&self) -> Result<u128, RpcError>;

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        input: Calldata,
    ) -> Result<u64, RpcError>;

    /// Read-only contract call, returns the raw return data.
    async fn call(&self, to: Address, input: Calldata) -> Result<Calldata, RpcError>;

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError>;

    /// Signs and broadcasts a transaction. An `Err` means nothing was broadcast, every later
    /// outcome arrives on the returned stream.
    async fn send_transaction(
        &self,
        params: TransactionParams,
        credential: Credential,
    ) -> Result<SubmissionEvents, RpcError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("0xdeadbeef");
        assert_eq!(format!("{credential:?}"), "Credential(***)");
        assert_eq!(credential.expose(), "0xdeadbeef");
    }

    #[test]
    fn timeout_is_distinct_from_rejection() {
        let timeout = SubmissionError::PendingConfirmationTimeout {
            detail: "not mined within 50 blocks".to_string(),
        };
        assert!(timeout.to_string().contains("not mined within 50 blocks"));
        assert_ne!(
            timeout,
            SubmissionError::Rejected {
                detail: "not mined within 50 blocks".to_string()
            }
        );
    }
}
