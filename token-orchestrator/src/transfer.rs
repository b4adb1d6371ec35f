// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::balance::BalanceReader;
use crate::common::TxHash;
use crate::contract::{CONTRACT_NAME, TRANSFER_METHOD};
use crate::error::{Error, Result};
use crate::notification::{
    LifecycleNotification, NotificationKind, NotificationPublisher, TRANSFER_TOPIC,
};
use crate::rpc::{ChainRpc, Credential, Receipt, TransactionParams};
use crate::submission::{Stage, Submission};
use crate::validation::validate_transfer;
use crate::Network;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;

/// The lifecycle stage at which `transfer` hands its result back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReturnPolicy {
    /// Right after the solvency check, before anything is sent to the node.
    #[default]
    OnAccepted,
    /// Once the node returned a transaction hash.
    OnSubmitted,
    /// Once the transaction is mined, or failed.
    OnConfirmed,
}

impl FromStr for ReturnPolicy {
    type Err = Infallible;

    /// Unknown values fall back to [`ReturnPolicy::OnAccepted`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let policy = match s {
            "submitted" | "onSubmitted" | "txHash" => ReturnPolicy::OnSubmitted,
            "confirmed" | "onConfirmed" | "txReceipt" => ReturnPolicy::OnConfirmed,
            _ => ReturnPolicy::OnAccepted,
        };
        Ok(policy)
    }
}

impl ReturnPolicy {
    pub fn parse_or_default(policy: Option<&str>) -> Self {
        policy
            .and_then(|policy| policy.parse().ok())
            .unwrap_or_default()
    }

    fn resolves_at(&self, state: TransferState) -> bool {
        match state {
            TransferState::Pending => *self == ReturnPolicy::OnAccepted,
            TransferState::Submitted => *self <= ReturnPolicy::OnSubmitted,
            TransferState::Confirmed => true,
            TransferState::Failed => false,
        }
    }
}

#[derive(Debug)]
pub struct TransferRequest {
    pub sender: String,
    pub credential: Credential,
    pub recipient: String,
    /// Smallest unit, base 10.
    pub amount: String,
    pub tag: String,
    pub return_policy: ReturnPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    Submitted,
    Confirmed,
    Failed,
}

impl TransferState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Confirmed | TransferState::Failed)
    }

    fn can_advance_to(&self, next: TransferState) -> bool {
        matches!(
            (self, next),
            (TransferState::Pending, TransferState::Submitted)
                | (TransferState::Pending, TransferState::Failed)
                | (TransferState::Submitted, TransferState::Confirmed)
                | (TransferState::Submitted, TransferState::Failed)
        )
    }
}

/// Identity of one transfer. The hash and receipt are each set at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferHandle {
    transfer_id: Uuid,
    transaction_hash: Option<TxHash>,
    receipt: Option<Receipt>,
}

impl TransferHandle {
    fn new() -> Self {
        Self {
            transfer_id: Uuid::new_v4(),
            transaction_hash: None,
            receipt: None,
        }
    }

    pub fn transfer_id(&self) -> Uuid {
        self.transfer_id
    }

    pub fn transaction_hash(&self) -> Option<TxHash> {
        self.transaction_hash
    }

    fn set_transaction_hash(&mut self, tx_hash: TxHash) {
        if self.transaction_hash.is_none() {
            self.transaction_hash = Some(tx_hash);
        }
    }

    fn set_receipt(&mut self, receipt: Receipt) {
        if self.receipt.is_none() {
            self.receipt = Some(receipt);
        }
    }

    fn outcome(&self) -> TransferOutcome {
        TransferOutcome {
            transfer_id: self.transfer_id,
            transaction_hash: self.transaction_hash,
            receipt: self.receipt.clone(),
        }
    }
}

/// What the caller gets back. A missing hash serialises as `""` and a missing receipt as `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    pub transfer_id: Uuid,
    #[serde(serialize_with = "hash_or_empty")]
    pub transaction_hash: Option<TxHash>,
    #[serde(serialize_with = "receipt_or_empty")]
    pub receipt: Option<Receipt>,
}

fn hash_or_empty<S: Serializer>(
    tx_hash: &Option<TxHash>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match tx_hash {
        Some(tx_hash) => tx_hash.serialize(serializer),
        None => serializer.serialize_str(""),
    }
}

fn receipt_or_empty<S: Serializer>(
    receipt: &Option<Receipt>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match receipt {
        Some(receipt) => receipt.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Hands the result to the caller once, at the stage the return policy names.
struct Resolver {
    policy: ReturnPolicy,
    sender: Option<oneshot::Sender<Result<TransferOutcome>>>,
}

impl Resolver {
    fn new(policy: ReturnPolicy) -> (Self, oneshot::Receiver<Result<TransferOutcome>>) {
        let (sender, receiver) = oneshot::channel();
        let resolver = Self {
            policy,
            sender: Some(sender),
        };
        (resolver, receiver)
    }

    fn reached(&mut self, state: TransferState, handle: &TransferHandle) {
        if self.policy.resolves_at(state) {
            self.resolve(Ok(handle.outcome()));
        }
    }

    fn reject(&mut self, err: Error) {
        self.resolve(Err(err));
    }

    fn resolve(&mut self, result: Result<TransferOutcome>) {
        if let Some(sender) = self.sender.take() {
            if sender.send(result).is_err() {
                debug!("Caller stopped waiting for the transfer result");
            }
        }
    }
}

/// Validates, checks solvency and submits plain value transfers, publishing their lifecycle.
#[derive(Clone)]
pub struct TransferOrchestrator {
    network: Network,
    rpc: Arc<dyn ChainRpc>,
    balances: BalanceReader,
    publisher: Arc<dyn NotificationPublisher>,
}

impl TransferOrchestrator {
    pub fn new(
        network: Network,
        rpc: Arc<dyn ChainRpc>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        let balances = BalanceReader::new(Arc::clone(&rpc));
        Self {
            network,
            rpc,
            balances,
            publisher,
        }
    }

    pub async fn transfer(&self, request: TransferRequest) -> Result<TransferOutcome> {
        let TransferRequest {
            sender,
            credential,
            recipient,
            amount,
            tag,
            return_policy,
        } = request;

        let validated = validate_transfer(&sender, &recipient, &amount, &tag)
            .inspect_err(|err| debug!("Rejected transfer from {sender} to {recipient}: {err}"))?;

        let check = self
            .balances
            .check_balance(validated.sender, validated.amount)
            .await?;
        if !check.sufficient {
            info!(
                "Insufficient funds for transfer from {sender}: balance {}, required {}",
                check.current_balance, check.required_balance
            );
            return Err(Error::InsufficientFunds {
                balance: check.current_balance.to_string(),
                required: check.required_balance.to_string(),
            });
        }

        let handle = TransferHandle::new();
        let params = TransactionParams {
            from: validated.sender,
            to: validated.recipient,
            value: validated.amount,
            gas_price: self.network.gas_price,
            gas_limit: self.network.transfer_gas_limit,
            input: None,
        };
        info!(
            "Transfer {} of {} from {sender} to {recipient} accepted",
            handle.transfer_id(),
            validated.amount
        );

        let (mut resolver, outcome) = Resolver::new(return_policy);
        resolver.reached(TransferState::Pending, &handle);

        let driver = TransferDriver {
            rpc: Arc::clone(&self.rpc),
            publisher: Arc::clone(&self.publisher),
            template: self.notification_template(params, tag),
            handle,
            state: TransferState::Pending,
            resolver,
        };
        let _handle = tokio::spawn(driver.run(credential));

        outcome.await.map_err(|_| {
            Error::SubmissionFailure("transfer stopped before reaching a result".to_string())
        })?
    }

    fn notification_template(
        &self,
        tx_params: TransactionParams,
        tag: String,
    ) -> LifecycleNotification {
        LifecycleNotification {
            topic: TRANSFER_TOPIC.to_string(),
            kind: NotificationKind::TransactionInitiated,
            transfer_id: Uuid::nil(),
            contract_name: CONTRACT_NAME.to_string(),
            contract_address: self.network.token_contract_address,
            method: TRANSFER_METHOD.to_string(),
            tx_params,
            transaction_hash: None,
            chain_id: self.network.chain_id,
            chain_kind: self.network.chain_kind,
            tag,
            error_detail: None,
        }
    }
}

/// Background task owning one transfer from submission to its terminal state.
struct TransferDriver {
    rpc: Arc<dyn ChainRpc>,
    publisher: Arc<dyn NotificationPublisher>,
    template: LifecycleNotification,
    handle: TransferHandle,
    state: TransferState,
    resolver: Resolver,
}

impl TransferDriver {
    async fn run(mut self, credential: Credential) {
        let events = match self
            .rpc
            .send_transaction(self.template.tx_params.clone(), credential)
            .await
        {
            Ok(events) => events,
            Err(err) => {
                self.fail(Error::SubmissionFailure(err.to_string()));
                return;
            }
        };

        let mut submission = Submission::new(Arc::clone(&self.rpc), events);
        while let Some(stage) = submission.next_stage().await {
            match stage {
                Stage::Submitted(tx_hash) => self.submitted(tx_hash),
                Stage::Confirmed(receipt) => self.confirmed(receipt),
                Stage::Failed(err) => self.fail(err),
            }
            if self.state.is_terminal() {
                break;
            }
        }

        if !self.state.is_terminal() {
            self.fail(Error::ConfirmationFailure(
                "transfer ended without being confirmed".to_string(),
            ));
        }
    }

    fn submitted(&mut self, tx_hash: TxHash) {
        if !self.advance(TransferState::Submitted) {
            return;
        }
        self.handle.set_transaction_hash(tx_hash);
        self.notify(NotificationKind::TransactionInitiated, None);
        self.resolver.reached(self.state, &self.handle);
    }

    fn confirmed(&mut self, receipt: Receipt) {
        if !self.advance(TransferState::Confirmed) {
            return;
        }
        self.handle.set_receipt(receipt);
        self.notify(NotificationKind::TransactionMined, None);
        self.resolver.reached(self.state, &self.handle);
    }

    fn fail(&mut self, err: Error) {
        if !self.advance(TransferState::Failed) {
            return;
        }
        error!("Transfer {} failed: {err}", self.handle.transfer_id());
        self.notify(NotificationKind::TransactionError, Some(err.to_string()));
        self.resolver.reject(err);
    }

    fn advance(&mut self, next: TransferState) -> bool {
        if !self.state.can_advance_to(next) {
            warn!(
                "Transfer {} ignoring move from {:?} to {next:?}",
                self.handle.transfer_id(),
                self.state
            );
            return false;
        }
        info!(
            "Transfer {} moved from {:?} to {next:?}",
            self.handle.transfer_id(),
            self.state
        );
        self.state = next;
        true
    }

    fn notify(&self, kind: NotificationKind, error_detail: Option<String>) {
        let notification = LifecycleNotification {
            kind,
            transfer_id: self.handle.transfer_id(),
            transaction_hash: self.handle.transaction_hash(),
            error_detail,
            ..self.template.clone()
        };
        if let Err(err) = self.publisher.publish(notification) {
            warn!(
                "Failed to publish {kind:?} for transfer {}: {err}",
                self.handle.transfer_id()
            );
        }
    }
}
