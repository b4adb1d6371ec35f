// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Specialisation of `std::Result`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse classification of an [`Error`], used by callers that only care about the family of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    InsufficientFunds,
    ChainReadFailure,
    SubmissionFailure,
    ConfirmationFailure,
    EstimationFailure,
    DependencyFailure,
}

/// Orchestration errors.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("Invalid sender address: {0}")]
    InvalidSenderAddress(String),
    #[error("Invalid recipient address: {0}")]
    InvalidRecipientAddress(String),
    #[error("Same sender & recipient address provided. Sender: {sender}, Recipient: {recipient}")]
    SameSenderAndRecipient { sender: String, recipient: String },
    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),
    #[error("Invalid transaction tag: {0:?}")]
    InvalidTag(String),
    #[error("Invalid blockchain address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: String, required: String },

    #[error("Could not read from the chain: {0}")]
    ChainRead(String),
    #[error("Contract call {method} failed: {reason}")]
    ContractCall { method: String, reason: String },

    /// The node refused the transaction before handing out a hash.
    #[error("Transaction submission failed: {0}")]
    SubmissionFailure(String),
    /// The transaction was submitted but could not be confirmed as mined.
    #[error("Transaction confirmation failed: {0}")]
    ConfirmationFailure(String),

    #[error("Gas estimation failed: {0}")]
    EstimationFailure(String),

    /// Cache or notification transport failure, never fatal to a transfer.
    #[error("Dependency failure: {0}")]
    DependencyFailure(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSenderAddress(_)
            | Error::InvalidRecipientAddress(_)
            | Error::SameSenderAndRecipient { .. }
            | Error::InvalidAmount(_)
            | Error::InvalidTag(_)
            | Error::InvalidAddress(_) => ErrorKind::InvalidInput,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::ChainRead(_) | Error::ContractCall { .. } => ErrorKind::ChainReadFailure,
            Error::SubmissionFailure(_) => ErrorKind::SubmissionFailure,
            Error::ConfirmationFailure(_) => ErrorKind::ConfirmationFailure,
            Error::EstimationFailure(_) => ErrorKind::EstimationFailure,
            Error::DependencyFailure(_) => ErrorKind::DependencyFailure,
        }
    }

    /// Stable machine readable code, one per violated rule.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidSenderAddress(_) => "invalid_sender_address",
            Error::InvalidRecipientAddress(_) => "invalid_recipient_address",
            Error::SameSenderAndRecipient { .. } => "same_sender_and_recipient",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::InvalidTag(_) => "invalid_tag",
            Error::InvalidAddress(_) => "invalid_address",
            Error::InsufficientFunds { .. } => "insufficient_funds",
            Error::ChainRead(_) => "chain_read_failed",
            Error::ContractCall { .. } => "contract_call_failed",
            Error::SubmissionFailure(_) => "submission_failed",
            Error::ConfirmationFailure(_) => "confirmation_failed",
            Error::EstimationFailure(_) => "gas_estimation_failed",
            Error::DependencyFailure(_) => "dependency_failed",
        }
    }
}
