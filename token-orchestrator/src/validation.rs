// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Stateless checks on addresses, amounts and tags.

use crate::common::{Address, Amount, U256};
use crate::error::{Error, Result};
use std::str::FromStr;

const MAX_TAG_LEN: usize = 64;

/// A transfer whose inputs passed every check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub sender: Address,
    pub recipient: Address,
    pub amount: Amount,
}

/// `0x` followed by 40 hex digits. Mixed case input must carry a valid EIP-55 checksum.
pub fn is_address_valid(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(address, None).is_ok();
    }
    true
}

pub fn parse_address(address: &str) -> Option<Address> {
    if !is_address_valid(address) {
        return None;
    }
    Address::from_str(address).ok()
}

/// Case-insensitive comparison of two textual addresses.
pub fn addresses_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Base-10 digits only, non-zero and within 256 bits.
pub fn parse_amount(amount: &str) -> Option<Amount> {
    if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value = U256::from_str_radix(amount, 10).ok()?;
    (value > U256::ZERO).then_some(value)
}

pub fn is_tag_valid(tag: &str) -> bool {
    (1..=MAX_TAG_LEN).contains(&tag.len())
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Runs every transfer check in order and reports the first violated rule.
pub fn validate_transfer(
    sender: &str,
    recipient: &str,
    amount: &str,
    tag: &str,
) -> Result<ValidatedTransfer> {
    let sender_address =
        parse_address(sender).ok_or_else(|| Error::InvalidSenderAddress(sender.to_string()))?;
    let recipient_address = parse_address(recipient)
        .ok_or_else(|| Error::InvalidRecipientAddress(recipient.to_string()))?;

    if addresses_equal(sender, recipient) {
        return Err(Error::SameSenderAndRecipient {
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        });
    }

    let amount = parse_amount(amount).ok_or_else(|| Error::InvalidAmount(amount.to_string()))?;

    if !is_tag_valid(tag) {
        return Err(Error::InvalidTag(tag.to_string()));
    }

    Ok(ValidatedTransfer {
        sender: sender_address,
        recipient: recipient_address,
        amount,
    })
}
