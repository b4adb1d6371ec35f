// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Calldata};
use crate::error::{Error, Result};
use crate::rpc::ChainRpc;
use crate::ChainKind;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use std::sync::Arc;

/// Percentage added on top of the node's estimate.
const GAS_HEADROOM_PERCENT: u64 = 10;

/// A request to price one contract method invocation by one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateGasRequest {
    pub contract_name: String,
    pub contract_address: Address,
    pub chain_kind: ChainKind,
    pub sender: Address,
    pub method_name: String,
    pub method_arguments: Vec<String>,
    #[serde(skip)]
    pub calldata: Calldata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub gas_to_use: u64,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait GasEstimator: Send + Sync {
    async fn estimate(&self, request: &EstimateGasRequest) -> Result<GasEstimate>;
}

/// Asks the node and pads the answer, refusing anything above `gas_limit`.
#[derive(Clone)]
pub struct RpcGasEstimator {
    rpc: Arc<dyn ChainRpc>,
    gas_limit: u64,
}

impl RpcGasEstimator {
    pub fn new(rpc: Arc<dyn ChainRpc>, gas_limit: u64) -> Self {
        Self { rpc, gas_limit }
    }
}

#[async_trait]
impl GasEstimator for RpcGasEstimator {
    async fn estimate(&self, request: &EstimateGasRequest) -> Result<GasEstimate> {
        debug!(
            "Estimating gas for {}.{} on {} by {:?}",
            request.contract_name, request.method_name, request.chain_kind, request.sender
        );
        let estimate = self
            .rpc
            .estimate_gas(
                request.sender,
                request.contract_address,
                request.calldata.clone(),
            )
            .await
            .map_err(|err| Error::EstimationFailure(err.to_string()))?;

        let headroom = estimate.saturating_mul(GAS_HEADROOM_PERCENT) / 100;
        let gas_to_use = estimate.saturating_add(headroom);
        if gas_to_use > self.gas_limit {
            error!(
                "Gas estimate {gas_to_use} for {} exceeds the limit of {}",
                request.method_name, self.gas_limit
            );
            return Err(Error::EstimationFailure(format!(
                "estimate of {gas_to_use} exceeds the gas limit of {}",
                self.gas_limit
            )));
        }

        Ok(GasEstimate { gas_to_use })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{test_utils::transport_error, MockChainRpc};

    fn request() -> EstimateGasRequest {
        EstimateGasRequest {
            contract_name: "utilityToken".to_string(),
            contract_address: Address::repeat_byte(0x0c),
            chain_kind: ChainKind::Utility,
            sender: Address::repeat_byte(0x01),
            method_name: "claim".to_string(),
            method_arguments: vec![Address::repeat_byte(0x02).to_string()],
            calldata: Calldata::from(vec![0x4e, 0x71, 0xd9, 0x2d]),
        }
    }

    #[tokio::test]
    async fn adds_headroom_to_node_estimate() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_estimate_gas()
            .withf(|from, to, _| {
                *from == Address::repeat_byte(0x01) && *to == Address::repeat_byte(0x0c)
            })
            .returning(|_, _, _| Ok(50_000));
        let estimator = RpcGasEstimator::new(Arc::new(rpc), 4_700_000);

        let estimate = estimator.estimate(&request()).await.unwrap();
        assert_eq!(estimate.gas_to_use, 55_000);
    }

    #[tokio::test]
    async fn estimate_over_limit_fails() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_estimate_gas().returning(|_, _, _| Ok(100_000));
        let estimator = RpcGasEstimator::new(Arc::new(rpc), 100_000);

        let err = estimator.estimate(&request()).await.unwrap_err();
        assert_eq!(err.code(), "gas_estimation_failed");
    }

    #[tokio::test]
    async fn node_error_is_estimation_failure() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_estimate_gas()
            .returning(|_, _, _| Err(transport_error("execution reverted")));
        let estimator = RpcGasEstimator::new(Arc::new(rpc), 4_700_000);

        let err = estimator.estimate(&request()).await.unwrap_err();
        assert!(err.to_string().contains("execution reverted"));
    }
}
