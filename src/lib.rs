pub mod access;
pub mod app;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod export;
pub mod lawcode;
pub mod mapper;
pub mod parser;
pub mod review;
pub mod sync;
pub mod table;
