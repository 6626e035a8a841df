//! Report rendering.
//!
//! Both report kinds list every prefix with its newest manifest date, one
//! `* YYYY-MM-DD: <bucket>/<prefix>` line each.

use crate::{
    config::MonitorConfig, models::notification::Notification,
    services::scanner::LatestDateByPrefix,
};

/// One line per prefix, each terminated by a newline.
pub fn format_dates_by_prefix(bucket: &str, dates: &LatestDateByPrefix) -> String {
    dates
        .iter()
        .map(|(prefix, date)| format!("* {}: {}/{}\n", date.format("%Y-%m-%d"), bucket, prefix))
        .collect()
}

/// Status report sent on request, whether or not anything is stale.
pub fn test_report(config: &MonitorConfig, latest: &LatestDateByPrefix) -> Notification {
    let listing = if latest.is_empty() {
        "There are no backups!".to_string()
    } else {
        format_dates_by_prefix(&config.bucket, latest)
    };

    Notification {
        sender: config.sender.clone(),
        recipient: config.recipient.clone(),
        subject: format!("Backup monitor results: {}", config.bucket),
        body: format!(
            "Most recent backups in bucket '{}':\n{}",
            config.bucket, listing
        ),
    }
}

/// Alert sent when at least one prefix is stale. Lists every prefix, not
/// only the stale ones.
pub fn stale_report(config: &MonitorConfig, latest: &LatestDateByPrefix) -> Notification {
    Notification {
        sender: config.sender.clone(),
        recipient: config.recipient.clone(),
        subject: format!("Missing recent backups: {}", config.bucket),
        body: format!(
            "The following locations have not been backed up in over {} day(s):\n{}\nPlease check to make sure backups are working properly.",
            config.max_age_days,
            format_dates_by_prefix(&config.bucket, latest)
        ),
    }
}
