use std::fs;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, fmt, Layer};
use tracing_subscriber::filter::{LevelFilter, FilterFn};
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_appender::{non_blocking, rolling};
use time::macros::offset;

/// 混合路由胜出记录使用的日志 target
pub const OUTCOME_TARGET: &str = "replay_outcome";

/// 日志管理器 - 基于target分类的日志系统
pub struct LoggerManager {
    _guards: Vec<non_blocking::WorkerGuard>,
}

impl LoggerManager {
    /// 初始化日志系统
    ///
    /// 日志分类：
    /// - replay.log: 回放过程日志
    /// - outcome.log: 混合路由胜出的交易 (每条一行)
    pub fn init(log_dir: impl AsRef<Path>) -> Self {
        let log_dir = log_dir.as_ref();
        let mut guards = Vec::new();

        // 创建日志目录
        fs::create_dir_all(log_dir).ok();

        // 配置时区为东八区 (UTC+8 上海时间)
        let timer = OffsetTime::new(
            offset!(+8),
            time::format_description::well_known::Rfc3339,
        );

        // 1. 控制台输出
        let console_layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_timer(timer.clone())
            .with_filter(LevelFilter::INFO);

        // 2. 回放日志 (replay.log)
        let (replay_writer, replay_guard) = {
            let appender = rolling::daily(log_dir, "replay.log");
            non_blocking(appender)
        };
        guards.push(replay_guard);

        let replay_layer = fmt::layer()
            .compact()
            .with_writer(replay_writer)
            .with_ansi(false)
            .with_target(true)
            .with_timer(timer.clone())
            .with_filter(LevelFilter::DEBUG)
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() != OUTCOME_TARGET
            }));

        // 3. 胜出记录日志 (outcome.log)
        let (outcome_writer, outcome_guard) = {
            let appender = rolling::daily(log_dir, "outcome.log");
            non_blocking(appender)
        };
        guards.push(outcome_guard);

        let outcome_layer = fmt::layer()
            .compact()
            .with_writer(outcome_writer)
            .with_ansi(false)
            .with_target(false)
            .with_timer(timer)
            .with_filter(FilterFn::new(|metadata| {
                metadata.target() == OUTCOME_TARGET
            }));

        // 初始化tracing订阅器
        tracing_subscriber::registry()
            .with(console_layer)
            .with(replay_layer)
            .with(outcome_layer)
            .init();

        Self { _guards: guards }
    }
}
