// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{Address, Calldata, Hash};
use crate::rpc::RpcError;
use alloy::sol;
use alloy::sol_types::SolCall;

/// Name under which the token contract appears in notifications and gas estimates.
pub const CONTRACT_NAME: &str = "utilityToken";

pub const CLAIM_METHOD: &str = "claim";
pub const INITIALIZE_METHOD: &str = "initialize";
pub const TRANSFER_METHOD: &str = "transfer";
pub const UUID_METHOD: &str = "uuid";

sol!(
    #[allow(missing_docs)]
    interface IUtilityToken {
        function claim(address beneficiary) external returns (bool);
        function initialize() external payable;
        function uuid() external view returns (bytes32);
    }
);

pub fn claim_calldata(beneficiary: Address) -> Calldata {
    IUtilityToken::claimCall { beneficiary }.abi_encode().into()
}

pub fn initialize_calldata() -> Calldata {
    IUtilityToken::initializeCall {}.abi_encode().into()
}

pub fn uuid_calldata() -> Calldata {
    IUtilityToken::uuidCall {}.abi_encode().into()
}

pub fn decode_uuid(output: &[u8]) -> Result<Hash, RpcError> {
    let decoded = IUtilityToken::uuidCall::abi_decode_returns(output, true)
        .map_err(|err| RpcError::Decode(err.to_string()))?;
    Ok(decoded._0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_calldata_is_selector_and_padded_address() {
        let beneficiary = Address::repeat_byte(0xab);
        let calldata = claim_calldata(beneficiary);

        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[..4], IUtilityToken::claimCall::SELECTOR.as_slice());
        assert_eq!(&calldata[16..], beneficiary.as_slice());
    }

    #[test]
    fn uuid_round_trip_through_return_data() {
        let uuid = Hash::repeat_byte(0x42);
        assert_eq!(decode_uuid(uuid.as_slice()).unwrap(), uuid);
        assert!(decode_uuid(&[0x01, 0x02]).is_err());
    }
}
