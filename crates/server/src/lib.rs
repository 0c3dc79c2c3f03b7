pub mod auth;
pub mod config;
pub mod db;
pub mod error_convert;
pub mod health;
pub mod openapi;
pub mod rate_limit;
pub mod repo;
pub mod rest;
pub mod service;
pub mod telemetry;
