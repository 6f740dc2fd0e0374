pub mod commands;
pub mod http;
pub mod simulator;
pub mod trace_init;
