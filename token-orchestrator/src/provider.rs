// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Calldata, TxHash, U256};
use crate::rpc::{
    ChainRpc, Credential, Receipt, RpcError, SubmissionError, SubmissionEvent, SubmissionEvents,
    TransactionParams, SUBMISSION_EVENTS_CAPACITY,
};
use crate::Network;
use alloy::network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy::providers::{
    PendingTransactionError, Provider, ProviderBuilder, ReqwestProvider, WatchTxError,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::mpsc;

/// [`ChainRpc`] over alloy's HTTP provider.
#[derive(Clone, Debug)]
pub struct AlloyRpc {
    provider: ReqwestProvider,
    rpc_url: alloy::transports::http::reqwest::Url,
    confirmation_timeout: Duration,
    required_confirmations: u64,
}

impl AlloyRpc {
    pub fn new(network: &Network) -> Self {
        debug!("Connecting to {} at {}", network.identifier(), network.rpc_url());
        let provider = ProviderBuilder::new().on_http(network.rpc_url().clone());
        Self {
            provider,
            rpc_url: network.rpc_url().clone(),
            confirmation_timeout: network.confirmation_timeout,
            required_confirmations: network.required_confirmations,
        }
    }
}

impl From<&TransactionReceipt> for Receipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_hash: receipt.block_hash,
            block_number: receipt.block_number,
            from: receipt.from,
            to: receipt.to,
            gas_used: u128::from(receipt.gas_used),
            effective_gas_price: receipt.effective_gas_price,
            status: ReceiptResponse::status(receipt),
        }
    }
}

fn transaction_request(params: &TransactionParams) -> TransactionRequest {
    let request = TransactionRequest::default()
        .with_from(params.from)
        .with_to(params.to)
        .with_value(params.value)
        .with_gas_price(params.gas_price)
        .with_gas_limit(params.gas_limit);
    match &params.input {
        Some(input) => request.with_input(input.clone()),
        None => request,
    }
}

fn submission_error(err: PendingTransactionError) -> SubmissionError {
    match err {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
            SubmissionError::PendingConfirmationTimeout {
                detail: err.to_string(),
            }
        }
        other => SubmissionError::Rejected {
            detail: other.to_string(),
        },
    }
}

/// A fresh event stream that already holds `Submitted(tx_hash)`.
fn submitted_events(tx_hash: TxHash) -> (mpsc::Sender<SubmissionEvent>, SubmissionEvents) {
    let (sender, receiver) = mpsc::channel(SUBMISSION_EVENTS_CAPACITY);
    if let Err(err) = sender.try_send(SubmissionEvent::Submitted(tx_hash)) {
        error!("Could not record submission of tx {tx_hash:?}: {err}");
    }
    (sender, receiver)
}

#[async_trait]
impl ChainRpc for AlloyRpc {
    async fn get_balance(&self, address: Address) -> Result<U256, RpcError> {
        debug!("Getting native balance of {address:?}");
        let balance = self
            .provider
            .get_balance(address)
            .await
            .inspect_err(|err| error!("Error getting balance of {address:?}: {err:?}"))?;
        Ok(balance)
    }

    async fn get_gas_price(&self) -> Result<u128, RpcError> {
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .inspect_err(|err| error!("Error getting gas price: {err:?}"))?;
        Ok(gas_price)
    }

    async fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        input: Calldata,
    ) -> Result<u64, RpcError> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);
        let gas = self
            .provider
            .estimate_gas(&request)
            .await
            .inspect_err(|err| error!("Error estimating gas for call to {to:?}: {err:?}"))?;
        u64::try_from(gas).map_err(|_| RpcError::Decode("gas estimate exceeds u64".to_string()))
    }

    async fn call(&self, to: Address, input: Calldata) -> Result<Calldata, RpcError> {
        let request = TransactionRequest::default().with_to(to).with_input(input);
        let output = self
            .provider
            .call(&request)
            .await
            .inspect_err(|err| error!("Error calling contract {to:?}: {err:?}"))?;
        Ok(output)
    }

    async fn get_transaction_receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, RpcError> {
        let maybe_receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .inspect_err(|err| error!("Error getting receipt of tx {tx_hash:?}: {err:?}"))?;
        Ok(maybe_receipt.as_ref().map(Receipt::from))
    }

    async fn send_transaction(
        &self,
        params: TransactionParams,
        credential: Credential,
    ) -> Result<SubmissionEvents, RpcError> {
        let signer = PrivateKeySigner::from_str(credential.expose())
            .map_err(|err| RpcError::InvalidCredential(err.to_string()))?;
        drop(credential);

        if signer.address() != params.from {
            return Err(RpcError::InvalidCredential(format!(
                "credential does not belong to sender {:?}",
                params.from
            )));
        }

        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(EthereumWallet::from(signer))
            .on_http(self.rpc_url.clone());

        let pending_tx_builder = provider
            .send_transaction(transaction_request(&params))
            .await
            .inspect_err(|err| {
                error!("Error sending transaction from {:?}: {err:?}", params.from)
            })?;

        let tx_hash = *pending_tx_builder.tx_hash();
        debug!("Transaction from {:?} is pending with tx_hash: {tx_hash:?}", params.from);

        let (sender, receiver) = submitted_events(tx_hash);

        let watcher = pending_tx_builder
            .with_required_confirmations(self.required_confirmations)
            .with_timeout(Some(self.confirmation_timeout));

        let _handle = tokio::spawn(async move {
            let event = match watcher.get_receipt().await {
                Ok(receipt) => SubmissionEvent::Confirmed(Receipt::from(&receipt)),
                Err(err) => {
                    error!("Error watching tx with hash {tx_hash:?}: {err:?}");
                    SubmissionEvent::Failed(submission_error(err))
                }
            };
            if sender.send(event).await.is_err() {
                trace!("Submission events for {tx_hash:?} were dropped by the receiver");
            }
        });

        Ok(receiver)
    }
}
