//! 时间工具模块

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Shanghai;

/// 获取当前上海时间
pub fn now_shanghai() -> DateTime<chrono_tz::Tz> {
    Utc::now().with_timezone(&Shanghai)
}

/// 获取当前上海时间的格式化字符串 (默认格式: YYYY-MM-DD HH:MM:SS)
pub fn now_shanghai_str() -> String {
    now_shanghai().format("%Y-%m-%d %H:%M:%S").to_string()
}
