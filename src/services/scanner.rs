//! Manifest scanner: walks a bucket listing and records, per prefix, the
//! date of the newest completed backup set.

use crate::{models::manifest::Manifest, services::lister_service::ListError};
use chrono::NaiveDate;
use futures::{Stream, StreamExt, pin_mut};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Newest manifest date per prefix, ordered by prefix.
///
/// A prefix with no manifests has no entry.
pub type LatestDateByPrefix = BTreeMap<String, NaiveDate>;

/// Consume a key listing in a single pass.
///
/// Keys that are not manifests are skipped. The first listing error aborts
/// the scan; nothing collected so far is returned.
pub async fn latest_dates_by_prefix<S>(keys: S) -> Result<LatestDateByPrefix, ListError>
where
    S: Stream<Item = Result<String, ListError>>,
{
    let mut latest = LatestDateByPrefix::new();
    let mut scanned = 0usize;
    let mut manifests = 0usize;

    pin_mut!(keys);
    while let Some(key) = keys.next().await {
        let key = key?;
        scanned += 1;
        match Manifest::from_key(&key) {
            Some(manifest) => {
                manifests += 1;
                record(&mut latest, manifest);
            }
            None => trace!(key = %key, "skipping non-manifest object"),
        }
    }

    debug!(scanned, manifests, prefixes = latest.len(), "scan complete");
    Ok(latest)
}

fn record(latest: &mut LatestDateByPrefix, manifest: Manifest<'_>) {
    match latest.get_mut(manifest.prefix) {
        Some(date) if manifest.date > *date => *date = manifest.date,
        Some(_) => {}
        None => {
            latest.insert(manifest.prefix.to_string(), manifest.date);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn scan(keys: &[&str]) -> LatestDateByPrefix {
        let keys = stream::iter(keys.iter().map(|k| Ok(k.to_string())));
        latest_dates_by_prefix(keys).await.unwrap()
    }

    #[tokio::test]
    async fn test_latest_date_wins_within_prefix() {
        let latest = scan(&[
            "a/x.20240101T000000Z.manifest1.gpg",
            "a/y.20240115T000000Z.manifest2.gpg",
        ])
        .await;
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["a"], date(2024, 1, 15));
    }

    #[tokio::test]
    async fn test_unordered_keys_across_prefixes() {
        let latest = scan(&[
            "hosts/db/full.20240310T020000Z.manifest.gpg",
            "hosts/web/inc.20240301T020000Z.manifest.gpg",
            "hosts/db/full.20240312T020000Z.vol1.difftar.gpg",
            "hosts/db/inc.20240302T020000Z.manifest.gpg",
            "hosts/web/inc.20240305T020000Z.manifest.gpg",
            "hosts/web/inc.20240303T020000Z.manifest.gpg",
            "root.20240101T000000Z.manifest.gpg",
        ])
        .await;
        assert_eq!(
            latest,
            LatestDateByPrefix::from([
                (String::new(), date(2024, 1, 1)),
                ("hosts/db".to_string(), date(2024, 3, 10)),
                ("hosts/web".to_string(), date(2024, 3, 5)),
            ])
        );
    }

    #[test]
    fn test_earlier_manifests_do_not_regress_latest() {
        let mut latest = LatestDateByPrefix::new();
        record(&mut latest, Manifest::from_key("a/x.20240115T000000Z.manifest.gpg").unwrap());
        record(&mut latest, Manifest::from_key("a/x.20231231T000000Z.manifest.gpg").unwrap());
        assert_eq!(latest["a"], date(2024, 1, 15));
        record(&mut latest, Manifest::from_key("a/x.20240116T000000Z.manifest.gpg").unwrap());
        assert_eq!(latest["a"], date(2024, 1, 16));
    }

    #[tokio::test]
    async fn test_non_manifests_contribute_nothing() {
        assert!(scan(&["a/file.manifest.gpg", "a/notes.txt", "b/"]).await.is_empty());
        assert!(scan(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_listing_error_aborts_scan() {
        let keys = stream::iter(vec![
            Ok("a/x.20240101T000000Z.manifest.gpg".to_string()),
            Err(ListError::Store {
                bucket: "backups".into(),
                message: "access denied".into(),
            }),
            Ok("b/x.20240101T000000Z.manifest.gpg".to_string()),
        ]);
        let err = latest_dates_by_prefix(keys).await.unwrap_err();
        assert!(err.to_string().contains("access denied"));
    }
}
