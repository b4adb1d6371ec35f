// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

#![allow(dead_code)]

use alloy::transports::TransportErrorKind;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use token_orchestrator::cache::MemoryCache;
use token_orchestrator::common::{Address, Calldata, Hash, TxHash, U256};
use token_orchestrator::gas::RpcGasEstimator;
use token_orchestrator::notification::NotificationChannel;
use token_orchestrator::rpc::{
    ChainRpc, Credential, Receipt, RpcError, SubmissionEvent, SubmissionEvents, TransactionParams,
};
use token_orchestrator::{Network, UtilityToken};
use tokio::sync::mpsc;

pub const SENDER: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
pub const RECIPIENT: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
pub const TOKEN_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// A chain node that answers from a script instead of the network.
#[derive(Default)]
pub struct ScriptedChain {
    pub balance: U256,
    pub gas_price: u128,
    pub gas_estimate: u64,
    pub lookup_receipt: Option<Receipt>,
    pub events: Mutex<Vec<SubmissionEvent>>,
    pub sent: Mutex<Vec<TransactionParams>>,
    pub balance_reads: AtomicUsize,
    pub receipt_lookups: AtomicUsize,
}

impl ScriptedChain {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            balance: U256::from(balance),
            gas_price: 1_000_000_000,
            ..Default::default()
        }
    }

    pub fn script(self, events: Vec<SubmissionEvent>) -> Self {
        *self.events.lock().unwrap_or_else(|e| e.into_inner()) = events;
        self
    }

    pub fn balance_reads(&self) -> usize {
        self.balance_reads.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<TransactionParams> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ChainRpc for ScriptedChain {
    async fn get_balance(&self, _address: Address) -> Result<U256, RpcError> {
        let _ = self.balance_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }

    async fn get_gas_price(&self) -> Result<u128, RpcError> {
        Ok(self.gas_price)
    }

    async fn estimate_gas(
        &self,
        _from: Address,
        _to: Address,
        _input: Calldata,
    ) -> Result<u64, RpcError> {
        Ok(self.gas_estimate)
    }

    async fn call(&self, _to: Address, _input: Calldata) -> Result<Calldata, RpcError> {
        Err(RpcError::Transport(TransportErrorKind::custom_str(
            "calls are not scripted",
        )))
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError> {
        let _ = self.receipt_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lookup_receipt
            .clone()
            .filter(|receipt| receipt.transaction_hash == tx_hash))
    }

    async fn send_transaction(
        &self,
        params: TransactionParams,
        _credential: Credential,
    ) -> Result<SubmissionEvents, RpcError> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(params);
        let events = std::mem::take(&mut *self.events.lock().unwrap_or_else(|e| e.into_inner()));

        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            let _ = tx.try_send(event);
        }
        Ok(rx)
    }
}

pub fn tx_hash(bytes: &[u8]) -> TxHash {
    TxHash::left_padding_from(bytes)
}

pub fn mined(tx_hash: TxHash) -> Receipt {
    Receipt {
        transaction_hash: tx_hash,
        block_hash: Some(Hash::repeat_byte(0x22)),
        block_number: Some(7),
        from: SENDER.parse().unwrap_or_default(),
        to: RECIPIENT.parse().ok(),
        gas_used: 21_000,
        effective_gas_price: 1_000_000_000,
        status: true,
    }
}

pub fn network() -> Network {
    Network::new("http://localhost:8545", TOKEN_CONTRACT, 1409)
        .unwrap_or_else(|err| panic!("test network: {err}"))
}

pub fn utility_token(chain: Arc<ScriptedChain>) -> (UtilityToken, NotificationChannel) {
    let network = network();
    let channel = NotificationChannel::new();
    let rpc: Arc<dyn ChainRpc> = chain;
    let estimator = Arc::new(RpcGasEstimator::new(Arc::clone(&rpc), network.gas_limit));
    let token = UtilityToken::new(
        network,
        rpc,
        estimator,
        Arc::new(MemoryCache::new()),
        Arc::new(channel.clone()),
    );
    (token, channel)
}
