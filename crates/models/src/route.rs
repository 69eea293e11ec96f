use serde::{Deserialize, Serialize};
use std::fmt;

use crate::asset::{AssetAmount, AssetIdentity};
use crate::quote::QuoteAmount;

/// 路由可使用的流动性协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    V2,
    V3,
    /// 混合路由 (同一路径中组合 V2/V3 池子)
    Mixed,
}

impl Protocol {
    /// 路由服务使用的参数值
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::V2 => "v2",
            Protocol::V3 => "v3",
            Protocol::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 交易方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// 固定输入数量
    ExactInput,
    /// 固定输出数量
    ExactOutput,
}

impl TradeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeDirection::ExactInput => "exactIn",
            TradeDirection::ExactOutput => "exactOut",
        }
    }
}

/// 路由报价请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuery {
    pub amount_in: AssetAmount,
    pub token_out: AssetIdentity,
    pub direction: TradeDirection,
    /// 报价固定在该区块的状态
    pub block_number: u64,
    pub protocols: Vec<Protocol>,
    pub force_mixed_routes: bool,
}

impl RouteQuery {
    /// 协议列表的逗号分隔形式 (如 "v2,v3,mixed")
    pub fn protocols_param(&self) -> String {
        self.protocols
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn allows(&self, protocol: Protocol) -> bool {
        self.protocols.contains(&protocol)
    }
}

/// 路由报价结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResult {
    /// 以 token_out 计价的输出数量
    pub quote: QuoteAmount,
    /// 路由路径描述
    pub route: String,
}

impl RouteResult {
    pub fn new(quote: QuoteAmount, route: String) -> Self {
        Self { quote, route }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::DEFAULT_DECIMALS;
    use ethers::types::Address;

    #[test]
    fn test_protocols_param() {
        let asset = AssetIdentity::new(Address::zero(), DEFAULT_DECIMALS, "A".to_string(), 1);
        let query = RouteQuery {
            amount_in: AssetAmount::new(asset.clone(), 1),
            token_out: asset,
            direction: TradeDirection::ExactInput,
            block_number: 15_000_000,
            protocols: vec![Protocol::V2, Protocol::V3, Protocol::Mixed],
            force_mixed_routes: true,
        };

        assert_eq!(query.protocols_param(), "v2,v3,mixed");
        assert!(query.allows(Protocol::Mixed));
        assert_eq!(query.direction.as_str(), "exactIn");
    }
}
