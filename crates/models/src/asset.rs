use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// 默认代币精度
pub const DEFAULT_DECIMALS: u8 = 18;

/// 回放中使用的代币信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIdentity {
    pub address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub chain_id: u64,
}

impl AssetIdentity {
    pub fn new(address: Address, decimals: u8, symbol: String, chain_id: u64) -> Self {
        Self {
            address,
            decimals,
            symbol,
            chain_id,
        }
    }

    /// 地址的 0x 小写十六进制形式
    pub fn address_hex(&self) -> String {
        format!("{:?}", self.address)
    }
}

/// 整个回放过程固定的交易对 (卖出 asset_a, 买入 asset_b)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    pub asset_a: AssetIdentity,
    pub asset_b: AssetIdentity,
}

impl AssetPair {
    pub fn new(asset_a: AssetIdentity, asset_b: AssetIdentity) -> Self {
        Self { asset_a, asset_b }
    }

    /// 判断给定的 (卖出, 买入) 地址是否属于该交易对
    pub fn matches(&self, token_in: Address, token_out: Address) -> bool {
        self.asset_a.address == token_in && self.asset_b.address == token_out
    }

    pub fn name(&self) -> String {
        format!("{}/{}", self.asset_a.symbol, self.asset_b.symbol)
    }
}

/// 某个代币的最小单位数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset: AssetIdentity,
    pub raw: u128,
}

impl AssetAmount {
    pub fn new(asset: AssetIdentity, raw: u128) -> Self {
        Self { asset, raw }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(addr: &str, symbol: &str) -> AssetIdentity {
        AssetIdentity::new(addr.parse().unwrap(), DEFAULT_DECIMALS, symbol.to_string(), 1)
    }

    #[test]
    fn test_pair_matches_is_directional() {
        let uni = asset("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984", "UNI");
        let aave = asset("0x7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9", "AAVE");
        let pair = AssetPair::new(uni.clone(), aave.clone());

        assert!(pair.matches(uni.address, aave.address));
        assert!(!pair.matches(aave.address, uni.address));
        assert_eq!(pair.name(), "UNI/AAVE");
    }

    #[test]
    fn test_address_hex_is_lowercase() {
        let uni = asset("0x1F9840a85d5aF5bf1D1762F925BDADdC4201F984", "UNI");
        assert_eq!(uni.address_hex(), "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984");
    }
}
