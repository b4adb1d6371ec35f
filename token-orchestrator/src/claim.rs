// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::U256;
use crate::contract::{claim_calldata, CLAIM_METHOD, CONTRACT_NAME};
use crate::error::{Error, Result};
use crate::gas::{EstimateGasRequest, GasEstimator};
use crate::rpc::{ChainRpc, Credential, TransactionParams};
use crate::submission::{submit_and_confirm, SubmissionReceipt};
use crate::validation::parse_address;
use crate::Network;
use std::sync::Arc;

/// Releases a beneficiary's allocated balance through the contract's `claim` method.
#[derive(Clone)]
pub struct ClaimOrchestrator {
    network: Network,
    rpc: Arc<dyn ChainRpc>,
    estimator: Arc<dyn GasEstimator>,
}

impl ClaimOrchestrator {
    pub fn new(
        network: Network,
        rpc: Arc<dyn ChainRpc>,
        estimator: Arc<dyn GasEstimator>,
    ) -> Self {
        Self {
            network,
            rpc,
            estimator,
        }
    }

    /// Submits `claim(beneficiary)` from `sender` and waits for it to be mined.
    ///
    /// Gas is estimated per call. On chains reporting a zero gas price the claim is sent at
    /// zero price, otherwise at the configured default.
    pub async fn claim(
        &self,
        sender: &str,
        credential: Credential,
        beneficiary: &str,
    ) -> Result<SubmissionReceipt> {
        let sender_address =
            parse_address(sender).ok_or_else(|| Error::InvalidSenderAddress(sender.to_string()))?;
        let beneficiary_address = parse_address(beneficiary)
            .ok_or_else(|| Error::InvalidRecipientAddress(beneficiary.to_string()))?;

        let current_gas_price = self
            .rpc
            .get_gas_price()
            .await
            .map_err(|err| Error::ChainRead(format!("gas price: {err}")))?;

        let calldata = claim_calldata(beneficiary_address);
        let estimate = self
            .estimator
            .estimate(&EstimateGasRequest {
                contract_name: CONTRACT_NAME.to_string(),
                contract_address: self.network.token_contract_address,
                chain_kind: self.network.chain_kind,
                sender: sender_address,
                method_name: CLAIM_METHOD.to_string(),
                method_arguments: vec![beneficiary.to_string()],
                calldata: calldata.clone(),
            })
            .await?;

        let gas_price = if current_gas_price == 0 {
            0
        } else {
            self.network.gas_price
        };
        debug!(
            "Claiming for {beneficiary} from {sender} with gas {} at price {gas_price}",
            estimate.gas_to_use
        );

        let params = TransactionParams {
            from: sender_address,
            to: self.network.token_contract_address,
            value: U256::ZERO,
            gas_price,
            gas_limit: estimate.gas_to_use,
            input: Some(calldata),
        };

        let confirmed = submit_and_confirm(Arc::clone(&self.rpc), params, credential)
            .await
            .inspect_err(|err| error!("Claim for {beneficiary} failed: {err}"))?;
        info!(
            "Claim for {beneficiary} confirmed with tx_hash: {:?}",
            confirmed.transaction_hash
        );
        Ok(confirmed)
    }
}
