//! Chatbot widget gateway — flow-driven lead dialogue plus a thin proxy to
//! the external RAG backend.

pub mod api;
pub mod compose;
pub mod config;
pub mod error;
pub mod flow;
pub mod probe;
pub mod proxy;
pub mod selection;
pub mod session;
pub mod tags;
pub mod widget;
