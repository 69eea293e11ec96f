mod logger;
pub mod time_utils;

pub use logger::{LoggerManager, OUTCOME_TARGET};
pub use time_utils::now_shanghai_str;
