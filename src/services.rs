pub mod authorized_payments;
pub mod handlers;
pub mod processor;
pub mod threeds;
pub mod vault_check;
pub mod webhook_engine;
