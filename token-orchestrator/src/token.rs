// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::balance::BalanceReader;
use crate::cache::{BalanceCache, CacheBackend, CachedBalance, MemoryCache};
use crate::claim::ClaimOrchestrator;
use crate::common::{serialize_decimal, Amount, Hash};
use crate::contract::{
    decode_uuid, initialize_calldata, uuid_calldata, INITIALIZE_METHOD, UUID_METHOD,
};
use crate::error::{Error, Result};
use crate::gas::{GasEstimator, RpcGasEstimator};
use crate::notification::{NotificationChannel, NotificationPublisher};
use crate::provider::AlloyRpc;
use crate::response::Response;
use crate::rpc::{ChainRpc, Credential, TransactionParams};
use crate::submission::{submit_and_confirm, SubmissionReceipt};
use crate::transfer::{TransferOrchestrator, TransferOutcome, TransferRequest};
use crate::validation::{parse_address, parse_amount};
use crate::Network;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    #[serde(serialize_with = "serialize_decimal")]
    pub balance: Amount,
}

/// Caller-facing operations on the utility token. Every operation resolves to a [`Response`].
#[derive(Clone)]
pub struct UtilityToken {
    network: Network,
    rpc: Arc<dyn ChainRpc>,
    balances: BalanceReader,
    cache: BalanceCache,
    transfers: TransferOrchestrator,
    claims: ClaimOrchestrator,
}

impl UtilityToken {
    pub fn new(
        network: Network,
        rpc: Arc<dyn ChainRpc>,
        estimator: Arc<dyn GasEstimator>,
        cache: Arc<dyn CacheBackend>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            balances: BalanceReader::new(Arc::clone(&rpc)),
            cache: BalanceCache::new(cache, network.chain_id),
            transfers: TransferOrchestrator::new(network.clone(), Arc::clone(&rpc), publisher),
            claims: ClaimOrchestrator::new(network.clone(), Arc::clone(&rpc), estimator),
            network,
            rpc,
        }
    }

    /// Wires the HTTP provider, an in-memory cache and an in-process notification channel.
    /// The channel is returned so callers can subscribe to lifecycle notifications.
    pub fn connect(network: Network) -> (Self, NotificationChannel) {
        let rpc: Arc<dyn ChainRpc> = Arc::new(AlloyRpc::new(&network));
        let estimator = Arc::new(RpcGasEstimator::new(Arc::clone(&rpc), network.gas_limit));
        let channel = NotificationChannel::new();
        let token = Self::new(
            network,
            rpc,
            estimator,
            Arc::new(MemoryCache::new()),
            Arc::new(channel.clone()),
        );
        (token, channel)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub async fn transfer(&self, request: TransferRequest) -> Response<TransferOutcome> {
        self.transfers.transfer(request).await.into()
    }

    pub async fn claim(
        &self,
        sender: &str,
        credential: Credential,
        beneficiary: &str,
    ) -> Response<SubmissionReceipt> {
        self.claims.claim(sender, credential, beneficiary).await.into()
    }

    pub async fn get_balance_of(&self, owner: &str) -> Response<Balance> {
        self.balances
            .get_balance_of(owner)
            .await
            .map(|balance| Balance { balance })
            .into()
    }

    pub async fn get_balance_from_cache(&self, owner: &str) -> Response<CachedBalance> {
        self.cache.get(owner).await.into()
    }

    pub async fn set_balance_to_cache(&self, owner: &str, balance: &str) -> Response<()> {
        self.cache.set(owner, balance).await.into()
    }

    /// The identifier the token contract was deployed with.
    pub async fn get_uuid(&self) -> Response<Hash> {
        self.uuid().await.into()
    }

    /// Funds the contract with the whole supply by calling its payable `initialize()`.
    pub async fn initial_transfer_to_contract(
        &self,
        sender: &str,
        credential: Credential,
        total_supply: &str,
    ) -> Response<SubmissionReceipt> {
        self.fund_contract(sender, credential, total_supply)
            .await
            .into()
    }

    async fn uuid(&self) -> Result<Hash> {
        let contract = self.network.token_contract_address;
        let output = self
            .rpc
            .call(contract, uuid_calldata())
            .await
            .map_err(|err| Error::ContractCall {
                method: UUID_METHOD.to_string(),
                reason: err.to_string(),
            })?;
        decode_uuid(&output).map_err(|err| Error::ContractCall {
            method: UUID_METHOD.to_string(),
            reason: err.to_string(),
        })
    }

    async fn fund_contract(
        &self,
        sender: &str,
        credential: Credential,
        total_supply: &str,
    ) -> Result<SubmissionReceipt> {
        let from =
            parse_address(sender).ok_or_else(|| Error::InvalidSenderAddress(sender.to_string()))?;
        let value = parse_amount(total_supply)
            .ok_or_else(|| Error::InvalidAmount(total_supply.to_string()))?;

        info!("Calling {INITIALIZE_METHOD} on the token contract with {value} from {sender}");
        let params = TransactionParams {
            from,
            to: self.network.token_contract_address,
            value,
            gas_price: self.network.gas_price,
            gas_limit: self.network.gas_limit,
            input: Some(initialize_calldata()),
        };
        submit_and_confirm(Arc::clone(&self.rpc), params, credential)
            .await
            .inspect_err(|err| error!("{INITIALIZE_METHOD} from {sender} failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Calldata, TxHash, U256};
    use crate::gas::MockGasEstimator;
    use crate::rpc::test_utils::{receipt, scripted_events, transport_error};
    use crate::rpc::{MockChainRpc, SubmissionEvent};

    const OWNER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    fn network() -> Network {
        Network::new(
            "http://localhost:8545",
            "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            1409,
        )
        .unwrap()
    }

    fn token(rpc: MockChainRpc) -> UtilityToken {
        UtilityToken::new(
            network(),
            Arc::new(rpc),
            Arc::new(MockGasEstimator::new()),
            Arc::new(MemoryCache::new()),
            Arc::new(NotificationChannel::new()),
        )
    }

    #[tokio::test]
    async fn balance_is_reported_as_decimal_string() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_get_balance()
            .returning(|_| Ok(U256::from(1000)));

        let response = token(rpc).get_balance_of(OWNER).await;
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_value(&response).unwrap()["data"]["balance"],
            "1000"
        );
    }

    #[tokio::test]
    async fn invalid_owner_is_a_failed_response() {
        let response = token(MockChainRpc::new()).get_balance_of("0x00").await;

        assert!(response.is_failure());
        assert_eq!(response.error_code.as_deref(), Some("invalid_address"));
    }

    #[tokio::test]
    async fn cache_round_trip_through_the_facade() {
        let token = token(MockChainRpc::new());

        assert_eq!(
            token.get_balance_from_cache(OWNER).await.data,
            Some(CachedBalance::Miss)
        );
        assert!(token.set_balance_to_cache(OWNER, "42").await.is_success());
        assert_eq!(
            token.get_balance_from_cache(OWNER).await.data,
            Some(CachedBalance::Hit(U256::from(42)))
        );
    }

    #[tokio::test]
    async fn uuid_is_read_from_the_contract() {
        let uuid = Hash::repeat_byte(0x77);
        let mut rpc = MockChainRpc::new();
        rpc.expect_call()
            .withf(|to, input| *to == network().token_contract_address && *input == uuid_calldata())
            .returning(move |_, _| Ok(Calldata::from(uuid.to_vec())));

        assert_eq!(token(rpc).get_uuid().await.data, Some(uuid));
    }

    #[tokio::test]
    async fn failed_uuid_call_is_a_contract_call_failure() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_call()
            .returning(|_, _| Err(transport_error("execution reverted")));

        let response = token(rpc).get_uuid().await;
        assert_eq!(response.error_code.as_deref(), Some("contract_call_failed"));
    }

    #[tokio::test]
    async fn initial_transfer_sends_the_supply_to_initialize() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_send_transaction()
            .withf(|params, _| {
                params.value == U256::from(800_000_000u64)
                    && params.to == network().token_contract_address
                    && params.gas_limit == network().gas_limit
                    && params.input == Some(initialize_calldata())
            })
            .return_once(|_, _| {
                Ok(scripted_events(vec![
                    SubmissionEvent::Submitted(TxHash::with_last_byte(0x01)),
                    SubmissionEvent::Confirmed(receipt(TxHash::with_last_byte(0x01), true)),
                ]))
            });

        let response = token(rpc)
            .initial_transfer_to_contract(OWNER, Credential::new("0x01"), "800000000")
            .await;
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn initial_transfer_rejects_zero_supply() {
        let mut rpc = MockChainRpc::new();
        rpc.expect_send_transaction().never();

        let response = token(rpc)
            .initial_transfer_to_contract(OWNER, Credential::new("0x01"), "0")
            .await;
        assert_eq!(response.error_code.as_deref(), Some("invalid_amount"));
    }
}
