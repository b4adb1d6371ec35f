// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Amount};
use crate::error::{Error, Result};
use crate::rpc::ChainRpc;
use crate::validation::parse_address;
use serde::Serialize;
use std::sync::Arc;

/// Outcome of a solvency check, derived fresh for every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheck {
    pub sufficient: bool,
    pub current_balance: Amount,
    pub required_balance: Amount,
}

/// Reads live balances from the chain. Never consults the cache.
#[derive(Clone)]
pub struct BalanceReader {
    rpc: Arc<dyn ChainRpc>,
}

impl BalanceReader {
    pub fn new(rpc: Arc<dyn ChainRpc>) -> Self {
        Self { rpc }
    }

    /// Live balance of `owner`. A malformed address fails before any network call.
    pub async fn get_balance_of(&self, owner: &str) -> Result<Amount> {
        let address =
            parse_address(owner).ok_or_else(|| Error::InvalidAddress(owner.to_string()))?;
        self.balance(address).await
    }

    pub async fn balance(&self, owner: Address) -> Result<Amount> {
        let balance = self
            .rpc
            .get_balance(owner)
            .await
            .map_err(|err| Error::ChainRead(format!("balance of {owner:?}: {err}")))?;
        debug!("Balance of {owner:?} is {balance}");
        Ok(balance)
    }

    pub async fn check_balance(&self, owner: Address, required: Amount) -> Result<BalanceCheck> {
        let current_balance = self.balance(owner).await?;
        Ok(BalanceCheck {
            sufficient: current_balance >= required,
            current_balance,
            required_balance: required,
        })
    }
}
