pub mod chat_service;
pub mod dashboard_service;

#[cfg(test)]
pub(crate) mod testing;
