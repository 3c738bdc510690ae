//! Admissions Service - Sequential identifier and fee-ledger engine.

pub mod config;
pub mod models;
pub mod services;
