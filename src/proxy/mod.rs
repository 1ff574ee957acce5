//! Proxy pool management
//!
//! Endpoints come from an external proxy-discovery source via configuration;
//! this module only tracks usage, selects the active proxy, and retires
//! exhausted or failing ones.

mod pool;

pub use pool::{PoolMode, ProxyPool, ProxyRecord};
