use serde::{Deserialize, Serialize};

/// 数据集中的一条原始记录 (`{"data": {...}}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTradeEnvelope {
    pub data: RawTrade,
}

/// 未清洗的链上成交，十六进制字段可能以 `\x` 开头
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrade {
    pub token_a_address: String,
    pub token_a_amount_raw: u128,
    pub token_b_address: String,
    pub token_b_amount_raw: u128,
    pub usd_amount: f64,
    pub tx_hash: String,
}

/// 清洗后的链上成交记录
///
/// 数量均为代币最小单位，没有做精度换算。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// 卖出代币地址
    pub token_a_address: String,
    /// 卖出数量
    pub token_a_amount_raw: u128,
    /// 买入代币地址
    pub token_b_address: String,
    /// 链上实际买到的数量
    pub token_b_amount_raw: u128,
    pub usd_amount: f64,
    pub tx_hash: String,
}
