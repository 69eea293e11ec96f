//! 回放错误类型

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    /// 数据集格式不符合预期，整个回放终止
    #[error("Malformed input {path:?}: {source}")]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 无法用于构造交易对的代币地址
    #[error("Invalid asset address {address}: {reason}")]
    InvalidAsset { address: String, reason: String },

    /// 交易对参数 (符号/精度) 无效或与数据集数量不匹配
    #[error("Invalid pair settings: {0}")]
    InvalidPairSettings(String),

    /// 交易哈希无法解析到区块，仅跳过该记录
    #[error("Chain lookup failed for {tx_hash}: {reason}")]
    ChainLookup { tx_hash: String, reason: String },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Routing service error: {0}")]
    Oracle(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReplayError {
    /// 是否只影响单条记录
    pub fn is_record_local(&self) -> bool {
        matches!(self, ReplayError::ChainLookup { .. })
    }
}
