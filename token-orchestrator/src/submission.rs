// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Turns the raw events of one `send_transaction` call into lifecycle stages.
//!
//! A submission yields `Submitted` at most once, followed by exactly one of `Confirmed` or
//! `Failed`. When waiting for the receipt times out, the receipt is looked up directly before
//! the submission is declared failed, since a slow chain may still have mined it.

use crate::common::TxHash;
use crate::error::{Error, Result};
use crate::rpc::{
    ChainRpc, Credential, Receipt, SubmissionError, SubmissionEvent, SubmissionEvents,
    TransactionParams,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Submitted(TxHash),
    Confirmed(Receipt),
    Failed(Error),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Stage::Submitted(_))
    }
}

/// Hash and receipt of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub transaction_hash: TxHash,
    pub receipt: Receipt,
}

pub struct Submission {
    rpc: Arc<dyn ChainRpc>,
    events: SubmissionEvents,
    tx_hash: Option<TxHash>,
    pending: VecDeque<Stage>,
    finished: bool,
}

impl Submission {
    pub fn new(rpc: Arc<dyn ChainRpc>, events: SubmissionEvents) -> Self {
        Self {
            rpc,
            events,
            tx_hash: None,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    /// The next stage, or `None` once the terminal stage has been handed out.
    pub async fn next_stage(&mut self) -> Option<Stage> {
        if let Some(stage) = self.pending.pop_front() {
            return Some(stage);
        }
        if self.finished {
            return None;
        }

        loop {
            let Some(event) = self.events.recv().await else {
                self.finished = true;
                return Some(Stage::Failed(self.stream_closed()));
            };

            match event {
                SubmissionEvent::Submitted(tx_hash) => {
                    if let Some(known) = self.tx_hash {
                        debug!("Ignoring repeated hash {tx_hash:?}, already submitted as {known:?}");
                        continue;
                    }
                    self.tx_hash = Some(tx_hash);
                    return Some(Stage::Submitted(tx_hash));
                }
                SubmissionEvent::Confirmed(receipt) => {
                    self.finished = true;
                    let Some(tx_hash) = self.tx_hash else {
                        let tx_hash = receipt.transaction_hash;
                        self.tx_hash = Some(tx_hash);
                        self.pending.push_back(settle(receipt));
                        return Some(Stage::Submitted(tx_hash));
                    };
                    return Some(settle_for(tx_hash, receipt));
                }
                SubmissionEvent::Failed(err) => {
                    self.finished = true;
                    return Some(self.recover(err).await);
                }
            }
        }
    }

    async fn recover(&self, err: SubmissionError) -> Stage {
        let Some(tx_hash) = self.tx_hash else {
            error!("Transaction was rejected before it was submitted: {err}");
            return Stage::Failed(Error::SubmissionFailure(err.to_string()));
        };

        match err {
            SubmissionError::PendingConfirmationTimeout { .. } => {
                info!("Confirmation of {tx_hash:?} timed out, looking up its receipt");
                match self.rpc.get_transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => {
                        info!("Found receipt for {tx_hash:?} after the confirmation timeout");
                        settle_for(tx_hash, receipt)
                    }
                    Ok(None) => Stage::Failed(Error::ConfirmationFailure(format!(
                        "{err}; no receipt found for {tx_hash:?}"
                    ))),
                    Err(lookup_err) => Stage::Failed(Error::ConfirmationFailure(format!(
                        "{err}; receipt lookup for {tx_hash:?} failed: {lookup_err}"
                    ))),
                }
            }
            SubmissionError::Rejected { .. } => {
                error!("Transaction {tx_hash:?} failed after submission: {err}");
                Stage::Failed(Error::ConfirmationFailure(err.to_string()))
            }
        }
    }

    fn stream_closed(&self) -> Error {
        match self.tx_hash {
            Some(tx_hash) => Error::ConfirmationFailure(format!(
                "submission events for {tx_hash:?} ended before confirmation"
            )),
            None => Error::SubmissionFailure(
                "submission events ended before a transaction hash was received".to_string(),
            ),
        }
    }
}

/// A reverted receipt counts as a failed confirmation.
fn settle(receipt: Receipt) -> Stage {
    if receipt.status {
        Stage::Confirmed(receipt)
    } else {
        Stage::Failed(Error::ConfirmationFailure(format!(
            "transaction {:?} reverted in block {:?}",
            receipt.transaction_hash, receipt.block_number
        )))
    }
}

/// Settles a receipt that must belong to the submitted `tx_hash`.
fn settle_for(tx_hash: TxHash, receipt: Receipt) -> Stage {
    if receipt.transaction_hash != tx_hash {
        error!(
            "Receipt for {:?} does not match submitted tx {tx_hash:?}",
            receipt.transaction_hash
        );
        return Stage::Failed(Error::ConfirmationFailure(format!(
            "receipt for {:?} does not belong to submitted transaction {tx_hash:?}",
            receipt.transaction_hash
        )));
    }
    settle(receipt)
}

/// Sends a transaction and waits until it is confirmed or has failed.
pub async fn submit_and_confirm(
    rpc: Arc<dyn ChainRpc>,
    params: TransactionParams,
    credential: Credential,
) -> Result<SubmissionReceipt> {
    let from = params.from;
    let events = rpc
        .send_transaction(params, credential)
        .await
        .map_err(|err| Error::SubmissionFailure(err.to_string()))?;

    let mut submission = Submission::new(rpc, events);
    while let Some(stage) = submission.next_stage().await {
        match stage {
            Stage::Submitted(tx_hash) => {
                debug!("Transaction from {from:?} submitted with tx_hash: {tx_hash:?}")
            }
            Stage::Confirmed(receipt) => {
                debug!("Transaction {:?} confirmed", receipt.transaction_hash);
                return Ok(SubmissionReceipt {
                    transaction_hash: receipt.transaction_hash,
                    receipt,
                });
            }
            Stage::Failed(err) => return Err(err),
        }
    }

    Err(Error::SubmissionFailure(
        "submission ended without a terminal stage".to_string(),
    ))
}
