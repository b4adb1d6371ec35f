// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::Address;
use crate::Network;
use rand::Rng;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// environment variables to connect to the utility chain
pub const RPC_URL: &str = "RPC_URL";
pub const TOKEN_CONTRACT_ADDRESS: &str = "TOKEN_CONTRACT_ADDRESS";
pub const CHAIN_ID: &str = "CHAIN_ID";
pub const GAS_PRICE: &str = "GAS_PRICE";
pub const GAS_LIMIT: &str = "GAS_LIMIT";
pub const CONFIRMATION_TIMEOUT_SECS: &str = "CONFIRMATION_TIMEOUT_SECS";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to get network: {0}")]
    FailedToGetNetwork(String),
}

/// Generate a random Address.
pub fn dummy_address() -> Address {
    Address::new(rand::rngs::OsRng.gen())
}

/// Get the `Network` from environment variables.
/// `RPC_URL`, `TOKEN_CONTRACT_ADDRESS` and `CHAIN_ID` must be set, the rest fall back to defaults.
pub fn get_network_from_env() -> Result<Network, Error> {
    let rpc_url = required_var(RPC_URL)?;
    let token_contract_address = required_var(TOKEN_CONTRACT_ADDRESS)?;
    let chain_id = parse_var::<u64>(CHAIN_ID, &required_var(CHAIN_ID)?)?;

    let mut network = Network::new(&rpc_url, &token_contract_address, chain_id)?;

    if let Ok(gas_price) = env::var(GAS_PRICE) {
        network.gas_price = parse_var(GAS_PRICE, &gas_price)?;
    }
    if let Ok(gas_limit) = env::var(GAS_LIMIT) {
        network.gas_limit = parse_var(GAS_LIMIT, &gas_limit)?;
    }
    if let Ok(timeout) = env::var(CONFIRMATION_TIMEOUT_SECS) {
        network.confirmation_timeout =
            Duration::from_secs(parse_var(CONFIRMATION_TIMEOUT_SECS, &timeout)?);
    }

    info!(
        "Using {} at {} with token contract {}",
        network.identifier(),
        network.rpc_url_http,
        network.token_contract_address
    );
    Ok(network)
}

fn required_var(name: &str) -> Result<String, Error> {
    env::var(name).map_err(|_| {
        error!("Missing env var {name}");
        Error::FailedToGetNetwork(format!(
            "missing env var {name}, make sure to set all of: {RPC_URL}, {TOKEN_CONTRACT_ADDRESS}, {CHAIN_ID}"
        ))
    })
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T, Error> {
    value.trim().parse::<T>().map_err(|_| {
        Error::FailedToGetNetwork(format!("env var {name} has an invalid value: {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_reports_the_variable() {
        let err = parse_var::<u64>(CHAIN_ID, "abc").unwrap_err();
        assert!(err.to_string().contains(CHAIN_ID));
        assert_eq!(parse_var::<u128>(GAS_PRICE, " 0 ").unwrap(), 0);
    }

    #[test]
    fn dummy_addresses_are_distinct() {
        assert_ne!(dummy_address(), dummy_address());
    }
}
