pub(crate) mod chain;
pub(crate) mod config;
pub(crate) mod event;
pub(crate) mod keys;
