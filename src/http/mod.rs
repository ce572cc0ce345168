pub mod dns_logging_connector;
pub mod probe;
pub mod timing_connector;
pub mod transport;
