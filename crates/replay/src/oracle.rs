//! 路由报价服务
//!
//! 路由本身由外部服务完成，这里只负责发送查询并解析报价。

use async_trait::async_trait;
use ethers::types::U256;
use models::{QuoteAmount, RouteQuery, RouteResult};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::ReplayError;

/// 路由服务在找不到路径时返回的错误码
const NO_ROUTE_ERROR_CODE: &str = "NO_ROUTE";

/// 路由报价接口
#[async_trait]
pub trait RouteOracle: Send + Sync {
    /// 请求报价，找不到可用路径时返回 `Ok(None)`
    async fn route(&self, query: &RouteQuery) -> Result<Option<RouteResult>, ReplayError>;
}

/// 报价响应
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    /// token_out 最小单位数量
    pub quote: String,
    #[serde(default)]
    pub route_string: String,
}

/// 错误响应
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    detail: Option<String>,
}

/// HTTP 路由报价客户端
pub struct RoutingApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl RoutingApiClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// 查询参数
    pub fn query_params(query: &RouteQuery) -> Vec<(&'static str, String)> {
        vec![
            ("tokenInAddress", query.amount_in.asset.address_hex()),
            ("tokenInChainId", query.amount_in.asset.chain_id.to_string()),
            ("tokenOutAddress", query.token_out.address_hex()),
            ("tokenOutChainId", query.token_out.chain_id.to_string()),
            ("amount", query.amount_in.raw.to_string()),
            ("type", query.direction.as_str().to_string()),
            ("protocols", query.protocols_param()),
            ("forceMixedRoutes", query.force_mixed_routes.to_string()),
            ("blockNumber", query.block_number.to_string()),
        ]
    }
}

#[async_trait]
impl RouteOracle for RoutingApiClient {
    async fn route(&self, query: &RouteQuery) -> Result<Option<RouteResult>, ReplayError> {
        let url = format!("{}/quote", self.base_url);

        debug!(
            "[Router] 获取报价: {} -> {}, amount={}, block={}, protocols={}",
            query.amount_in.asset.symbol,
            query.token_out.symbol,
            query.amount_in.raw,
            query.block_number,
            query.protocols_param()
        );

        let mut request = self.client.get(&url).query(&Self::query_params(query));
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReplayError::Oracle(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReplayError::Oracle(e.to_string()))?;

        parse_quote_response(status, &body, query.token_out.decimals)
    }
}

/// 解析路由服务响应
///
/// 404 或 `NO_ROUTE` 视为没有可用路径，其余非 2xx 状态为服务错误。
pub fn parse_quote_response(
    status: StatusCode,
    body: &str,
    decimals_out: u8,
) -> Result<Option<RouteResult>, ReplayError> {
    if !status.is_success() {
        let error = serde_json::from_str::<ErrorResponse>(body).ok();
        let no_route = status == StatusCode::NOT_FOUND
            || error
                .as_ref()
                .map_or(false, |e| e.error_code == NO_ROUTE_ERROR_CODE);

        if no_route {
            return Ok(None);
        }

        let detail = error
            .and_then(|e| e.detail)
            .unwrap_or_else(|| body.to_string());
        return Err(ReplayError::Oracle(format!("{} - {}", status, detail)));
    }

    let quote: QuoteResponse = serde_json::from_str(body)
        .map_err(|e| ReplayError::Oracle(format!("invalid quote response: {}", e)))?;

    let raw = U256::from_dec_str(&quote.quote)
        .map_err(|e| ReplayError::Oracle(format!("invalid quote amount {}: {}", quote.quote, e)))?;

    Ok(Some(RouteResult::new(
        QuoteAmount::from_raw(raw, decimals_out),
        quote.route_string,
    )))
}
