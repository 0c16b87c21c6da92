pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod models;
pub(crate) mod service;
pub(crate) mod store;
pub(crate) mod validator;
