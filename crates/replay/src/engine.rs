//! 回放引擎
//!
//! 链上的混合路由报价合约只在较新的区块才存在，因此无法直接回放历史上的混合路由报价。
//! 这里对每笔历史成交在其确认区块上分别请求两次报价：
//! 1. 基准报价：只允许 V2/V3
//! 2. 混合报价：允许 V2/V3/MIXED 并强制混合路由
//!
//! 两次查询必须使用同一个区块号，混合报价严格大于基准报价时记录差值。

use config_crate::RoutingPolicy;
use ethers::types::U256;
use models::{
    AssetAmount, AssetIdentity, ComparisonOutcome, QuoteAmount, RouteQuery, RouteResult,
    TradeRecord,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::ChainDataClient;
use crate::error::ReplayError;
use crate::oracle::RouteOracle;

/// 每笔成交的两次查询
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteLeg {
    /// 不允许混合路由
    Baseline,
    /// 强制混合路由
    Mixed,
}

impl fmt::Display for RouteLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteLeg::Baseline => f.write_str("baseline"),
            RouteLeg::Mixed => f.write_str("mixed"),
        }
    }
}

/// 单笔成交的回放结论
#[derive(Debug, Clone, PartialEq)]
pub enum TradeVerdict {
    /// 混合路由更优
    Improved {
        outcome: ComparisonOutcome,
        gain: QuoteAmount,
    },
    /// 混合路由不优于 (等于或小于) 基准路由
    NotBetter {
        mixed: QuoteAmount,
        baseline: QuoteAmount,
    },
    /// 某一次查询没有找到路径
    NoRoute(RouteLeg),
}

impl TradeVerdict {
    pub fn outcome(&self) -> Option<&ComparisonOutcome> {
        match self {
            TradeVerdict::Improved { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    pub fn into_outcome(self) -> Option<ComparisonOutcome> {
        match self {
            TradeVerdict::Improved { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

/// 比较两次报价，只有混合报价严格更大时才产生结果
pub fn compare_quotes(
    trade: &TradeRecord,
    baseline: &RouteResult,
    mixed: &RouteResult,
) -> TradeVerdict {
    if mixed.quote > baseline.quote {
        if let Some(gain) = mixed.quote.checked_sub(&baseline.quote) {
            return TradeVerdict::Improved {
                outcome: ComparisonOutcome {
                    mixed_route_quote: mixed.quote.to_exact(),
                    old_quote: baseline.quote.to_exact(),
                    delta: gain.to_exact(),
                    data: trade.clone(),
                },
                gain,
            };
        }
    }

    TradeVerdict::NotBetter {
        mixed: mixed.quote,
        baseline: baseline.quote,
    }
}

/// 回放引擎
pub struct ReplayEngine {
    chain: Arc<dyn ChainDataClient>,
    oracle: Arc<dyn RouteOracle>,
    policy: RoutingPolicy,
}

impl ReplayEngine {
    pub fn new(
        chain: Arc<dyn ChainDataClient>,
        oracle: Arc<dyn RouteOracle>,
        policy: RoutingPolicy,
    ) -> Self {
        Self {
            chain,
            oracle,
            policy,
        }
    }

    /// 当前链上最新区块 (仅用于日志)
    pub async fn current_block_number(&self) -> Result<u64, ReplayError> {
        self.chain.current_block_number().await
    }

    /// 构造某一次查询
    pub fn build_query(
        &self,
        amount_in: &AssetAmount,
        token_out: &AssetIdentity,
        block_number: u64,
        leg: RouteLeg,
    ) -> RouteQuery {
        let (protocols, force_mixed_routes) = match leg {
            RouteLeg::Baseline => (self.policy.baseline_protocols.clone(), false),
            RouteLeg::Mixed => (
                self.policy.mixed_protocols.clone(),
                self.policy.force_mixed_routes,
            ),
        };

        RouteQuery {
            amount_in: amount_in.clone(),
            token_out: token_out.clone(),
            direction: self.policy.trade_direction,
            block_number,
            protocols,
            force_mixed_routes,
        }
    }

    /// 回放单笔成交
    ///
    /// 交易无法定位到区块时返回 `ReplayError::ChainLookup`，由调用方决定跳过。
    pub async fn evaluate(
        &self,
        trade: &TradeRecord,
        asset_a: &AssetIdentity,
        asset_b: &AssetIdentity,
    ) -> Result<TradeVerdict, ReplayError> {
        // 区块号只查询一次，两次报价都固定在这个区块
        let block_number = self.chain.block_number_for_tx(&trade.tx_hash).await?;
        info!("交易 {} 所在区块: {}", trade.tx_hash, block_number);

        let amount_in = AssetAmount::new(asset_a.clone(), trade.token_a_amount_raw);

        let baseline_query = self.build_query(&amount_in, asset_b, block_number, RouteLeg::Baseline);
        let baseline = match self.oracle.route(&baseline_query).await? {
            Some(result) => result,
            None => {
                warn!("未找到普通路由报价，跳过交易 {:?}", trade);
                return Ok(TradeVerdict::NoRoute(RouteLeg::Baseline));
            }
        };

        let mixed_query = self.build_query(&amount_in, asset_b, block_number, RouteLeg::Mixed);
        let mixed = match self.oracle.route(&mixed_query).await? {
            Some(result) => result,
            None => {
                warn!("未找到混合路由报价，跳过交易 {:?}", trade);
                return Ok(TradeVerdict::NoRoute(RouteLeg::Mixed));
            }
        };

        let executed = QuoteAmount::from_raw(U256::from(trade.token_b_amount_raw), asset_b.decimals);
        info!("链上实际成交数量: {} {}", executed, asset_b.symbol);
        info!("普通路由报价: {} {}", baseline.quote, asset_b.symbol);
        info!("混合路由报价: {} {}", mixed.quote, asset_b.symbol);
        debug!("普通路由: {}", baseline.route);
        debug!("混合路由: {}", mixed.route);

        let verdict = compare_quotes(trade, &baseline, &mixed);
        if let TradeVerdict::Improved { gain, .. } = &verdict {
            info!("混合路由优于普通路由, 收益: {} {}", gain, asset_b.symbol);
        }

        Ok(verdict)
    }
}
