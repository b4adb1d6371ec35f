// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

#[macro_use]
extern crate tracing;

use crate::common::Address;
use alloy::transports::http::reqwest;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

pub mod balance;
pub mod cache;
pub mod claim;
pub mod common;
pub mod contract;
pub mod error;
pub mod gas;
pub mod notification;
pub mod provider;
pub mod response;
pub mod rpc;
pub mod submission;
pub mod token;
pub mod transfer;
pub mod utils;
pub mod validation;

pub use error::{Error, ErrorKind, Result};
pub use response::Response;
pub use token::UtilityToken;
pub use transfer::{ReturnPolicy, TransferOutcome, TransferRequest};

/// Gas limit used for a plain value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 25_000;
/// 1 gwei
pub const DEFAULT_GAS_PRICE: u128 = 1_000_000_000;
pub const DEFAULT_GAS_LIMIT: u64 = 4_700_000;
/// Roughly 50 blocks at 15 seconds each.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(750);
pub const DEFAULT_REQUIRED_CONFIRMATIONS: u64 = 1;

/// Which chain the token contract lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Value,
    Utility,
}

impl std::fmt::Display for ChainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainKind::Value => write!(f, "value"),
            ChainKind::Utility => write!(f, "utility"),
        }
    }
}

/// Connection and fee settings for the chain hosting the utility token contract.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    pub rpc_url_http: reqwest::Url,
    pub token_contract_address: Address,
    pub chain_id: u64,
    pub chain_kind: ChainKind,
    pub gas_price: u128,
    /// Gas limit for contract calls that do not estimate gas.
    pub gas_limit: u64,
    pub transfer_gas_limit: u64,
    pub confirmation_timeout: Duration,
    pub required_confirmations: u64,
}

impl Network {
    pub fn new(
        rpc_url: &str,
        token_contract_address: &str,
        chain_id: u64,
    ) -> std::result::Result<Self, utils::Error> {
        let rpc_url_http = reqwest::Url::parse(rpc_url).map_err(|err| {
            utils::Error::FailedToGetNetwork(format!("invalid RPC URL {rpc_url:?}: {err}"))
        })?;
        let token_contract_address = Address::from_str(token_contract_address).map_err(|err| {
            utils::Error::FailedToGetNetwork(format!(
                "invalid token contract address {token_contract_address:?}: {err}"
            ))
        })?;

        Ok(Self {
            rpc_url_http,
            token_contract_address,
            chain_id,
            chain_kind: ChainKind::Utility,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
            transfer_gas_limit: TRANSFER_GAS_LIMIT,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            required_confirmations: DEFAULT_REQUIRED_CONFIRMATIONS,
        })
    }

    pub fn rpc_url(&self) -> &reqwest::Url {
        &self.rpc_url_http
    }

    pub fn identifier(&self) -> String {
        format!("{}-{}", self.chain_kind, self.chain_id)
    }
}
