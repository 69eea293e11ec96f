//! 原始成交记录清洗
//!
//! 数据导出时十六进制字段可能被写成 `\x1234...`，这里替换为 `0x1234...`。

use models::{RawTrade, RawTradeEnvelope, TradeRecord};

/// 被错误转义的十六进制前缀
const ESCAPED_HEX_PREFIX: &str = "\\x";
const HEX_PREFIX: &str = "0x";

/// 只替换第一个 `\x`
pub fn fix_hex_prefix(value: &str) -> String {
    value.replacen(ESCAPED_HEX_PREFIX, HEX_PREFIX, 1)
}

pub fn normalize_trade(raw: RawTrade) -> TradeRecord {
    TradeRecord {
        token_a_address: fix_hex_prefix(&raw.token_a_address),
        token_a_amount_raw: raw.token_a_amount_raw,
        token_b_address: fix_hex_prefix(&raw.token_b_address),
        token_b_amount_raw: raw.token_b_amount_raw,
        usd_amount: raw.usd_amount,
        tx_hash: fix_hex_prefix(&raw.tx_hash),
    }
}

/// 清洗整个数据集，保持原有顺序
pub fn normalize(raw: Vec<RawTradeEnvelope>) -> Vec<TradeRecord> {
    raw.into_iter().map(|envelope| normalize_trade(envelope.data)).collect()
}
