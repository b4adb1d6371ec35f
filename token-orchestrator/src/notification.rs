// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, TxHash};
use crate::error::{Error, Result};
use crate::rpc::TransactionParams;
use crate::ChainKind;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Topic carrying every transfer lifecycle event.
pub const TRANSFER_TOPIC: &str = "transfer.utility_token";

const NOTIFICATION_CHANNEL_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TransactionInitiated,
    TransactionMined,
    TransactionError,
}

impl NotificationKind {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationKind::TransactionInitiated)
    }
}

/// One stage transition of a transfer, as seen by external consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleNotification {
    pub topic: String,
    pub kind: NotificationKind,
    pub transfer_id: Uuid,
    pub contract_name: String,
    pub contract_address: Address,
    pub method: String,
    pub tx_params: TransactionParams,
    pub transaction_hash: Option<TxHash>,
    pub chain_id: u64,
    pub chain_kind: ChainKind,
    pub tag: String,
    pub error_detail: Option<String>,
}

/// Fire-and-forget sink for lifecycle notifications. Must not block.
#[cfg_attr(test, automock)]
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: LifecycleNotification) -> Result<()>;
}

/// In-process notification bus. Multiple receivers can be actively listening.
#[derive(Clone, Debug)]
pub struct NotificationChannel(broadcast::Sender<LifecycleNotification>);

impl Default for NotificationChannel {
    fn default() -> Self {
        Self(broadcast::channel(NOTIFICATION_CHANNEL_SIZE).0)
    }
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> NotificationReceiver {
        NotificationReceiver(self.0.subscribe())
    }
}

impl NotificationPublisher for NotificationChannel {
    fn publish(&self, notification: LifecycleNotification) -> Result<()> {
        let kind = notification.kind;
        let transfer_id = notification.transfer_id;
        if self.0.send(notification).is_err() {
            trace!("No subscribers for {kind:?} of transfer {transfer_id}");
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct NotificationReceiver(broadcast::Receiver<LifecycleNotification>);

impl NotificationReceiver {
    pub async fn recv(&mut self) -> Result<LifecycleNotification> {
        self.0
            .recv()
            .await
            .map_err(|err| Error::DependencyFailure(format!("notification channel: {err}")))
    }

    /// Everything published so far, without waiting.
    pub fn drain(&mut self) -> Vec<LifecycleNotification> {
        let mut notifications = vec![];
        while let Ok(notification) = self.0.try_recv() {
            notifications.push(notification);
        }
        notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::U256;

    fn notification(kind: NotificationKind) -> LifecycleNotification {
        LifecycleNotification {
            topic: TRANSFER_TOPIC.to_string(),
            kind,
            transfer_id: Uuid::new_v4(),
            contract_name: "utilityToken".to_string(),
            contract_address: Address::repeat_byte(0x0c),
            method: "transfer".to_string(),
            tx_params: TransactionParams {
                from: Address::repeat_byte(0x01),
                to: Address::repeat_byte(0x02),
                value: U256::from(100),
                gas_price: 1_000_000_000,
                gas_limit: 25_000,
                input: None,
            },
            transaction_hash: None,
            chain_id: 1409,
            chain_kind: ChainKind::Utility,
            tag: "test".to_string(),
            error_detail: None,
        }
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let channel = NotificationChannel::new();
        assert!(channel
            .publish(notification(NotificationKind::TransactionInitiated))
            .is_ok());
    }

    #[tokio::test]
    async fn subscribers_receive_in_order() {
        let channel = NotificationChannel::new();
        let mut receiver = channel.subscribe();

        channel
            .publish(notification(NotificationKind::TransactionInitiated))
            .unwrap();
        channel
            .publish(notification(NotificationKind::TransactionMined))
            .unwrap();

        assert_eq!(
            receiver.recv().await.unwrap().kind,
            NotificationKind::TransactionInitiated
        );
        let kinds: Vec<_> = receiver.drain().into_iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![NotificationKind::TransactionMined]);
    }

    #[test]
    fn serialises_kind_in_snake_case() {
        let value = serde_json::to_value(notification(NotificationKind::TransactionError)).unwrap();
        assert_eq!(value["kind"], "transaction_error");
        assert_eq!(value["chain_kind"], "utility");
    }
}
