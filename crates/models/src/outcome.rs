use serde::{Deserialize, Serialize};

use crate::trade::TradeRecord;

/// 混合路由优于普通路由时的比较结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonOutcome {
    /// 允许并强制混合路由时的报价
    pub mixed_route_quote: String,
    /// 仅 V2/V3 路由时的报价
    pub old_quote: String,
    /// mixed_route_quote - old_quote
    pub delta: String,
    pub data: TradeRecord,
}
