//! coin-dash: a market-data proxy and live crypto price dashboard.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod proxy;
pub mod sparkline;
pub mod web;
