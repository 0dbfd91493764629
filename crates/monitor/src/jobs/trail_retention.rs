//! Trail retention background job.

use chrono::{Duration, Utc};
use tracing::{info, warn};

use persistence::repositories::{LocationTrailRepository, ZoneRepository};

use super::scheduler::{Job, JobFrequency};

/// Prunes trail samples older than the retention period from every zone.
pub struct TrailRetentionJob {
    zones: ZoneRepository,
    trails: LocationTrailRepository,
    retention_days: u32,
}

impl TrailRetentionJob {
    /// Create a new retention job.
    ///
    /// # Arguments
    /// * `zones` - Zones whose trails are pruned
    /// * `trails` - Trail repository
    /// * `retention_days` - Number of days of samples to keep
    pub fn new(zones: ZoneRepository, trails: LocationTrailRepository, retention_days: u32) -> Self {
        Self {
            zones,
            trails,
            retention_days,
        }
    }

    /// Prunes every zone's trail, returning the number of samples removed.
    ///
    /// A zone whose trail cannot be pruned is logged and the rest continue.
    pub async fn prune_all(&self) -> Result<usize, String> {
        let cutoff = Utc::now() - Duration::days(i64::from(self.retention_days));
        let zones = self
            .zones
            .list()
            .await
            .map_err(|e| format!("Failed to load zones: {}", e))?;

        let mut total_removed = 0;
        for zone in &zones {
            match self.trails.prune_older_than(&zone.id, cutoff).await {
                Ok(removed) => total_removed += removed,
                Err(e) => warn!(zone_id = %zone.id, error = %e, "Failed to prune trail"),
            }
            // Small yield so monitor writes are not held up
            tokio::task::yield_now().await;
        }

        Ok(total_removed)
    }
}

#[async_trait::async_trait]
impl Job for TrailRetentionJob {
    fn name(&self) -> &'static str {
        "trail_retention"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let removed = self.prune_all().await?;
        info!(
            removed,
            retention_days = self.retention_days,
            "Pruned old trail samples"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use domain::models::PositionSample;
    use persistence::keys::ZONES_KEY;
    use persistence::{KeyValueStore, MemoryStore};

    const ZONES: &str = r#"[
        {"id":"z1","nome":"Garden","latitude":-23.5505,"longitude":-46.6333,"raio":50,"horarioInicio":"08:00","horarioFim":"18:00"},
        {"id":"z2","nome":"School","latitude":"-23.56","longitude":"-46.64","raio":100,"horarioInicio":"00:00","horarioFim":"00:00"}
    ]"#;

    #[tokio::test]
    async fn test_prunes_old_samples_in_every_zone() {
        let store = Arc::new(MemoryStore::new());
        store.set(ZONES_KEY, ZONES.to_string()).await.unwrap();

        let zones = ZoneRepository::new(store.clone());
        let trails = LocationTrailRepository::new(store.clone());
        let now = Utc::now();
        for zone_id in ["z1", "z2"] {
            trails
                .append(zone_id, &PositionSample::new(-23.0, -46.0, now - Duration::days(40)))
                .await
                .unwrap();
            trails
                .append(zone_id, &PositionSample::new(-23.0, -46.0, now - Duration::hours(1)))
                .await
                .unwrap();
        }

        let job = TrailRetentionJob::new(zones, trails.clone(), 30);
        assert_eq!(job.prune_all().await.unwrap(), 2);
        assert_eq!(trails.list("z1").await.unwrap().len(), 1);
        assert_eq!(trails.list("z2").await.unwrap().len(), 1);

        assert!(job.execute().await.is_ok());
        assert_eq!(job.name(), "trail_retention");
        assert_eq!(job.frequency(), JobFrequency::Hourly);
    }

    #[tokio::test]
    async fn test_no_zones_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let job = TrailRetentionJob::new(
            ZoneRepository::new(store.clone()),
            LocationTrailRepository::new(store),
            7,
        );
        assert_eq!(job.prune_all().await.unwrap(), 0);
    }
}
