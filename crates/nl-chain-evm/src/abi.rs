//! ERC-721 call and log encoding for the three reads and the mint event the
//! dashboard uses.

use alloy_primitives::{Address, B256, U256, hex, keccak256};
use alloy_sol_types::{SolCall, SolEvent, sol};
use nl_api_types::{TokenId, WalletAddress};

sol! {
    function balanceOf(address owner) external view returns (uint256 balance);
    function ownerOf(uint256 tokenId) external view returns (address owner);
    function tokenURI(uint256 tokenId) external view returns (string uri);

    event MintEvent(address indexed to, uint256 tokenId);
}

/// Mint event watched when no other signature is configured.
pub const DEFAULT_MINT_EVENT_SIGNATURE: &str = <MintEvent as SolEvent>::SIGNATURE;

pub fn parse_address(address: &WalletAddress) -> Result<Address, String> {
    address
        .0
        .trim()
        .parse::<Address>()
        .map_err(|err| format!("invalid address '{}': {err}", address.0))
}

/// Lowercase `0x` form, the shape accounts arrive in from the node.
pub fn wallet_address(address: Address) -> WalletAddress {
    WalletAddress(hex::encode_prefixed(address))
}

pub fn balance_of_call(owner: &WalletAddress) -> Result<String, String> {
    let call = balanceOfCall {
        owner: parse_address(owner)?,
    };
    Ok(hex::encode_prefixed(call.abi_encode()))
}

pub fn owner_of_call(token_id: TokenId) -> String {
    let call = ownerOfCall {
        tokenId: U256::from(token_id.0),
    };
    hex::encode_prefixed(call.abi_encode())
}

pub fn token_uri_call(token_id: TokenId) -> String {
    let call = tokenURICall {
        tokenId: U256::from(token_id.0),
    };
    hex::encode_prefixed(call.abi_encode())
}

fn to_u64(value: U256, what: &str) -> Result<u64, String> {
    u64::try_from(value).map_err(|_| format!("{what} {value} does not fit in u64"))
}

pub fn decode_balance(data: &[u8]) -> Result<u64, String> {
    let returned = balanceOfCall::abi_decode_returns(data, true).map_err(|err| err.to_string())?;
    to_u64(returned.balance, "balance")
}

pub fn decode_owner(data: &[u8]) -> Result<WalletAddress, String> {
    let returned = ownerOfCall::abi_decode_returns(data, true).map_err(|err| err.to_string())?;
    Ok(wallet_address(returned.owner))
}

pub fn decode_token_uri(data: &[u8]) -> Result<String, String> {
    let returned = tokenURICall::abi_decode_returns(data, true).map_err(|err| err.to_string())?;
    Ok(returned.uri)
}

/// topic0 for an event signature such as `MintEvent(address,uint256)`.
pub fn event_topic(signature: &str) -> String {
    hex::encode_prefixed(keccak256(signature.trim().as_bytes()))
}

/// Indexed-address topic as used in `eth_getLogs` filters.
pub fn address_topic(address: &WalletAddress) -> Result<String, String> {
    Ok(hex::encode_prefixed(parse_address(address)?.into_word()))
}

pub fn parse_topic(value: &str) -> Result<B256, String> {
    value
        .trim()
        .parse::<B256>()
        .map_err(|err| format!("invalid topic '{value}': {err}"))
}

pub fn topic_address(topic: B256) -> WalletAddress {
    wallet_address(Address::from_word(topic))
}

pub fn topic_uint(topic: B256) -> Result<u64, String> {
    to_u64(U256::from_be_bytes(topic.0), "topic value")
}

/// First 32-byte word of non-indexed log data, read as a `uint256`.
pub fn leading_uint(data: &[u8]) -> Result<u64, String> {
    let word = data
        .get(..32)
        .ok_or_else(|| format!("log data too short: {} bytes", data.len()))?;
    to_u64(U256::from_be_slice(word), "log value")
}

pub fn decode_hex(value: &str) -> Result<Vec<u8>, String> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|err| format!("invalid hex '{value}': {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    const OWNER: &str = "0x00000000000000000000000000000000000000aa";

    #[test]
    fn balance_of_calldata_matches_solidity_encoding() {
        let data = balance_of_call(&WalletAddress(OWNER.to_owned())).unwrap();
        assert_eq!(
            data,
            "0x70a08231\
             00000000000000000000000000000000000000000000000000000000000000aa"
        );
    }

    #[test]
    fn token_calls_encode_id_as_uint256() {
        assert_eq!(
            owner_of_call(TokenId(5)),
            "0x6352211e0000000000000000000000000000000000000000000000000000000000000005"
        );
        assert!(token_uri_call(TokenId(258)).ends_with("0102"));
        assert!(token_uri_call(TokenId(258)).starts_with("0xc87b56dd"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(balance_of_call(&WalletAddress("0x1234".to_owned())).is_err());
        assert!(balance_of_call(&WalletAddress("not-hex".to_owned())).is_err());
    }

    #[test]
    fn decodes_returned_values() {
        assert_eq!(decode_balance(&U256::from(3).abi_encode()).unwrap(), 3);
        assert!(decode_balance(&U256::MAX.abi_encode()).is_err());
        assert!(decode_balance(&[]).is_err());

        let owner = parse_address(&WalletAddress(OWNER.to_owned())).unwrap();
        assert_eq!(decode_owner(&owner.abi_encode()).unwrap().0, OWNER);

        let uri = "https://meta.example/tokens/0.json".to_owned();
        assert_eq!(decode_token_uri(&uri.abi_encode()).unwrap(), uri);
        let mut truncated = uri.abi_encode();
        truncated.truncate(70);
        assert!(decode_token_uri(&truncated).is_err());
    }

    #[test]
    fn mint_topic_is_hashed_from_the_signature() {
        assert_eq!(DEFAULT_MINT_EVENT_SIGNATURE, "MintEvent(address,uint256)");
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert_eq!(
            event_topic(DEFAULT_MINT_EVENT_SIGNATURE),
            hex::encode_prefixed(MintEvent::SIGNATURE_HASH)
        );
    }

    #[test]
    fn topics_round_trip_addresses_and_ids() {
        let topic = parse_topic(&address_topic(&WalletAddress(OWNER.to_owned())).unwrap()).unwrap();
        assert_eq!(topic_address(topic).0, OWNER);
        assert_eq!(topic_uint(B256::from(U256::from(9).to_be_bytes::<32>())).unwrap(), 9);
        assert_eq!(leading_uint(&U256::from(4).abi_encode()).unwrap(), 4);
        assert!(leading_uint(&[0_u8; 4]).is_err());
    }
}
