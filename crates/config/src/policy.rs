//! 路由查询策略
//!
//! 两次查询只在允许的协议和是否强制混合路由上不同。

use anyhow::{bail, Result};
use models::{Protocol, TradeDirection};

/// 所有回放查询使用的交易方向
pub const TRADE_DIRECTION: TradeDirection = TradeDirection::ExactInput;

/// 基准查询允许的协议 (不含混合路由)
pub const BASELINE_PROTOCOLS: &[Protocol] = &[Protocol::V2, Protocol::V3];

/// 混合查询允许的协议
pub const MIXED_PROTOCOLS: &[Protocol] = &[Protocol::V2, Protocol::V3, Protocol::Mixed];

/// 混合查询是否强制使用混合路由
pub const FORCE_MIXED_ROUTES: bool = true;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub trade_direction: TradeDirection,
    pub baseline_protocols: Vec<Protocol>,
    pub mixed_protocols: Vec<Protocol>,
    pub force_mixed_routes: bool,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            trade_direction: TRADE_DIRECTION,
            baseline_protocols: BASELINE_PROTOCOLS.to_vec(),
            mixed_protocols: MIXED_PROTOCOLS.to_vec(),
            force_mixed_routes: FORCE_MIXED_ROUTES,
        }
    }
}

impl RoutingPolicy {
    /// 基准查询不能包含混合路由，混合查询必须包含
    pub fn validate(&self) -> Result<()> {
        if self.trade_direction != TradeDirection::ExactInput {
            bail!("Only exact-input replay is supported");
        }
        if self.baseline_protocols.is_empty() {
            bail!("Baseline protocol set is empty");
        }
        if self.baseline_protocols.contains(&Protocol::Mixed) {
            bail!("Baseline protocol set must not include MIXED");
        }
        if !self.mixed_protocols.contains(&Protocol::Mixed) {
            bail!("Mixed protocol set must include MIXED");
        }
        Ok(())
    }
}
