pub mod api;
pub mod logger;
pub mod settings;

pub mod server;

pub mod application_port;
pub mod application_impl;
pub mod domain_model;
pub mod domain_port;
pub mod gate;
pub mod infra_memory;
pub mod infra_mysql;
pub mod infra_redis;
