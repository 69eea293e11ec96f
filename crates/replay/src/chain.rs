//! 链上数据查询

use anyhow::Result;
use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::H256,
};
use std::sync::Arc;
use tracing::debug;

use crate::error::ReplayError;

/// 链上数据查询接口
#[async_trait]
pub trait ChainDataClient: Send + Sync {
    /// 获取交易被确认的区块号
    ///
    /// 交易不存在或尚未确认时返回 `ReplayError::ChainLookup`。
    async fn block_number_for_tx(&self, tx_hash: &str) -> Result<u64, ReplayError>;

    /// 获取当前最新区块号
    async fn current_block_number(&self) -> Result<u64, ReplayError>;
}

/// 基于 ethers HTTP Provider 的实现
pub struct EthersChainClient {
    provider: Arc<Provider<Http>>,
}

impl EthersChainClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }
}

#[async_trait]
impl ChainDataClient for EthersChainClient {
    async fn block_number_for_tx(&self, tx_hash: &str) -> Result<u64, ReplayError> {
        let hash = parse_tx_hash(tx_hash)?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ReplayError::Provider(e.to_string()))?
            .ok_or_else(|| ReplayError::ChainLookup {
                tx_hash: tx_hash.to_string(),
                reason: "receipt not found".to_string(),
            })?;

        let block_number = receipt
            .block_number
            .ok_or_else(|| ReplayError::ChainLookup {
                tx_hash: tx_hash.to_string(),
                reason: "transaction not yet mined".to_string(),
            })?
            .as_u64();

        debug!("交易 {} 所在区块: {}", tx_hash, block_number);
        Ok(block_number)
    }

    async fn current_block_number(&self) -> Result<u64, ReplayError> {
        let block_number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| ReplayError::Provider(e.to_string()))?;

        Ok(block_number.as_u64())
    }
}

/// 解析交易哈希，格式错误视为查询失败
pub fn parse_tx_hash(tx_hash: &str) -> Result<H256, ReplayError> {
    let trimmed = tx_hash.trim();
    let hex_part = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex_part.len() != 64 {
        return Err(ReplayError::ChainLookup {
            tx_hash: tx_hash.to_string(),
            reason: format!("expected 32-byte hash, got {} hex chars", hex_part.len()),
        });
    }

    hex_part.parse::<H256>().map_err(|e| ReplayError::ChainLookup {
        tx_hash: tx_hash.to_string(),
        reason: format!("invalid transaction hash: {}", e),
    })
}
