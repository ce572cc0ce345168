#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate tracing;

pub mod app;
pub mod bench;
pub mod cli;
pub mod http;
pub mod report;
pub mod sign;
pub mod timing;
pub mod tls;
