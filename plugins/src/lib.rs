mod http;

pub mod auth;
pub mod factory;
pub mod services;
pub mod store;
