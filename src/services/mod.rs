pub mod lister_service;
pub mod monitor_service;
pub mod notifier_service;
pub mod report;
pub mod scanner;
pub mod staleness;
