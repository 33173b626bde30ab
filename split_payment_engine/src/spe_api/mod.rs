pub mod settlement_api;
pub mod settlement_flow_api;
