pub mod contract;
pub mod market;
