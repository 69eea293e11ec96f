mod asset;
mod quote;
mod route;
mod trade;
mod outcome;

pub use asset::*;
pub use quote::*;
pub use route::*;
pub use trade::*;
pub use outcome::*;
