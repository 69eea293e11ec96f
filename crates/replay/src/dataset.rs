//! 数据集读取

use std::fs;
use std::path::Path;

use models::{RawTradeEnvelope, TradeRecord};

use crate::error::ReplayError;
use crate::normalizer::normalize;

/// 读取原始数据集，格式不符时整体失败
pub fn load_dataset(path: &Path) -> Result<Vec<RawTradeEnvelope>, ReplayError> {
    let content = fs::read_to_string(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_dataset(path, &content)
}

pub fn parse_dataset(path: &Path, content: &str) -> Result<Vec<RawTradeEnvelope>, ReplayError> {
    serde_json::from_str(content).map_err(|source| ReplayError::MalformedInput {
        path: path.to_path_buf(),
        source,
    })
}

/// 读取并清洗
pub fn load_trades(path: &Path) -> Result<Vec<TradeRecord>, ReplayError> {
    Ok(normalize(load_dataset(path)?))
}
