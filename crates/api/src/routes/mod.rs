//! Route handlers

pub mod alerts;
pub mod call;
pub mod demo;
pub mod languages;
