//! HTTP handlers for the CFDI chat service.

pub mod chat;
pub mod health;
