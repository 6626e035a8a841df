pub mod check_handlers;
pub mod health_handlers;
