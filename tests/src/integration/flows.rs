//! # Ingest → Rebuild → Distribute
//!
//! ```text
//! ReportBatch ──> IngestionService (ha-03) ──> EpochSeedStore (ha-01)
//!                        │ request_rebuild(generation)
//!                        ▼
//!                 FilterBuilder / RebuildScheduler (ha-02) ──> ArtifactPublisher
//!                                                                   │
//!                                          DistributionService (ha-04)
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{random_records, record, Pipeline};
    use ha_01_epoch_store::EpochSeedStore;
    use ha_02_contagion_filter::{FilterConfig, FilterKind};
    use ha_03_ingestion::{AuthError, IngestError};
    use ha_04_distribution::DistributionApi;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_types::{
        ContagiousReport, Credential, Epoch, ReportBatch, Seed, WireRecord, SEED_LENGTH,
    };
    use std::sync::Arc;

    // =========================================================================
    // SCENARIOS
    // =========================================================================

    #[test]
    fn test_two_record_report_is_distributed() {
        let p = Pipeline::inline(FilterConfig::default());
        let aa = Seed::new([0xaa; SEED_LENGTH]);
        let bb = Seed::new([0xbb; SEED_LENGTH]);

        let receipt = p
            .ingestion
            .commit_batch(p.batch(vec![record(100, 0xaa), record(101, 0xbb)]))
            .unwrap();
        assert_eq!(receipt.records, 2);

        let snapshot = p.store.iterate_all();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.seeds_for(Epoch(100)).collect::<Vec<_>>(), vec![aa]);
        assert_eq!(snapshot.seeds_for(Epoch(101)).collect::<Vec<_>>(), vec![bb]);

        let artifact = p.distribution.get_filter();
        let filter = artifact.decode_filter().unwrap();
        assert!(filter.contains_record(Epoch(100), &aa));
        assert!(filter.contains_record(Epoch(101), &bb));
        assert_eq!(artifact.record_count, 2);
    }

    #[test]
    fn test_two_reporters_same_epoch_both_distributed() {
        let p = Pipeline::inline(FilterConfig::default());
        let first = record(100, 0xaa);
        let second = record(100, 0xbb);

        p.ingestion.commit_batch(p.batch(vec![first])).unwrap();
        p.ingestion.commit_batch(p.batch(vec![second])).unwrap();

        let snapshot = p.store.iterate_all();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(&first) && snapshot.contains(&second));

        let artifact = p.distribution.get_filter();
        assert_eq!(artifact.record_count, 2);
        let filter = artifact.decode_filter().unwrap();
        assert!(filter.contains_record(first.epoch, &first.seed));
        assert!(filter.contains_record(second.epoch, &second.seed));
    }

    #[test]
    fn test_invalid_credential_leaves_everything_unchanged() {
        let p = Pipeline::inline(FilterConfig::default());
        let before = p.distribution.get_filter();

        let err = p
            .ingestion
            .commit_batch(ReportBatch::new(
                Credential::new("v1.forged"),
                vec![record(100, 0xaa)],
            ))
            .unwrap_err();

        assert!(matches!(err, IngestError::Authorization(_)));
        assert!(p.store.iterate_all().is_empty());
        assert_eq!(p.distribution.get_filter(), before);
    }

    #[test]
    fn test_batch_with_one_malformed_record_stores_nothing() {
        let p = Pipeline::inline(FilterConfig::default());
        let report = ContagiousReport {
            authorization: p.token().as_str().to_string(),
            data: vec![
                WireRecord::new(100, "aa".repeat(16)),
                WireRecord::new(101, "bb".repeat(15)),
            ],
        };

        assert!(ReportBatch::from_wire(report).is_err());
        assert!(p.store.is_empty());
        assert_eq!(p.distribution.get_filter().version, 0);
    }

    #[test]
    fn test_resubmission_is_idempotent() {
        let p = Pipeline::inline(FilterConfig::default());
        let records = vec![record(7, 7), record(8, 8)];

        p.ingestion.commit_batch(p.batch(records.clone())).unwrap();
        let first = p.store.iterate_all();
        p.ingestion.commit_batch(p.batch(records)).unwrap();
        let second = p.store.iterate_all();

        assert_eq!(
            first.iter().collect::<Vec<_>>(),
            second.iter().collect::<Vec<_>>()
        );
        assert_eq!(p.distribution.get_filter().record_count, 2);
    }

    #[test]
    fn test_versions_strictly_increase() {
        let p = Pipeline::inline(FilterConfig::default());
        let mut last = p.distribution.get_filter().version;
        for i in 0..5u32 {
            p.ingestion
                .commit_batch(p.batch(vec![record(i, i as u8)]))
                .unwrap();
            let version = p.distribution.get_filter().version;
            assert!(version > last);
            last = version;
        }
    }

    #[test]
    fn test_storage_failure_keeps_previous_filter() {
        let p = Pipeline::inline(FilterConfig::default());
        p.ingestion.commit_batch(p.batch(vec![record(1, 1)])).unwrap();
        let published = p.distribution.get_filter();

        p.faults.fail_writes(true);
        let batch = p.batch(vec![record(2, 2)]);
        let err = p.ingestion.commit_batch(batch.clone()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(p.distribution.get_filter(), published);

        // Same token again once storage recovers
        p.faults.fail_writes(false);
        p.ingestion.commit_batch(batch.clone()).unwrap();
        assert_eq!(p.store.len(), 2);
        assert!(matches!(
            p.ingestion.commit_batch(batch),
            Err(IngestError::Authorization(AuthError::AlreadyUsed))
        ));
    }

    #[test]
    fn test_bloom_pipeline_has_no_false_negatives() {
        let p = Pipeline::inline(FilterConfig::default().with_kind(FilterKind::Bloom));
        let mut rng = StdRng::seed_from_u64(7);
        let records = random_records(&mut rng, 1_000, 500);

        p.ingestion.commit_batch(p.batch(records.clone())).unwrap();
        let filter = p.distribution.get_filter().decode_filter().unwrap();
        assert_eq!(filter.kind(), FilterKind::Bloom);
        for r in &records {
            assert!(filter.contains_record(r.epoch, &r.seed));
        }
    }

    // =========================================================================
    // BACKGROUND REBUILDS
    // =========================================================================

    #[tokio::test]
    async fn test_rebuild_after_commit_covers_batch() {
        let p = Pipeline::scheduled(FilterConfig::default());
        let receipt = p
            .ingestion
            .commit_batch(p.batch(vec![record(42, 0x42)]))
            .unwrap();

        p.settle(receipt.generation).await;
        let artifact = p.distribution.get_filter();
        assert!(artifact.generation >= receipt.generation);
        assert!(artifact
            .decode_filter()
            .unwrap()
            .contains_record(Epoch(42), &Seed::new([0x42; SEED_LENGTH])));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_disjoint_batches() {
        let p = Arc::new(Pipeline::scheduled(FilterConfig::default()));
        let mut rng = StdRng::seed_from_u64(11);
        let all = random_records(&mut rng, 0, 80);

        let tasks: Vec<_> = all
            .chunks(10)
            .map(|chunk| {
                let p = Arc::clone(&p);
                let batch = p.batch(chunk.to_vec());
                tokio::task::spawn_blocking(move || p.ingestion.commit_batch(batch).unwrap())
            })
            .collect();

        let mut generations = Vec::new();
        for task in tasks {
            generations.push(task.await.unwrap().generation);
        }
        generations.sort_unstable();
        generations.dedup();
        assert_eq!(generations.len(), 8, "each batch commits as its own generation");

        p.settle(p.store.generation()).await;
        let filter = p.distribution.get_filter().decode_filter().unwrap();
        assert_eq!(p.store.len(), 80);
        for r in &all {
            assert!(filter.contains_record(r.epoch, &r.seed));
        }
        if let Some(scheduler) = &p.scheduler {
            scheduler.shutdown().await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_batches_sharing_epochs() {
        let p = Arc::new(Pipeline::scheduled(FilterConfig::default()));
        let mut rng = StdRng::seed_from_u64(23);

        // Eight reporters, all active during epochs 5000..5010
        let reporters: Vec<Vec<_>> = (0..8).map(|_| random_records(&mut rng, 5_000, 10)).collect();

        let tasks: Vec<_> = reporters
            .iter()
            .map(|records| {
                let p = Arc::clone(&p);
                let batch = p.batch(records.clone());
                tokio::task::spawn_blocking(move || p.ingestion.commit_batch(batch).unwrap())
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        p.settle(p.store.generation()).await;
        let snapshot = p.store.iterate_all();
        let filter = p.distribution.get_filter().decode_filter().unwrap();
        assert_eq!(snapshot.len(), 80);
        for r in reporters.iter().flatten() {
            assert!(snapshot.contains(r));
            assert!(filter.contains_record(r.epoch, &r.seed));
        }
        assert_eq!(snapshot.seeds_for(Epoch(5_000)).count(), 8);
        if let Some(scheduler) = &p.scheduler {
            scheduler.shutdown().await;
        }
    }

    #[test]
    fn test_reopened_store_rebuilds_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server-database.db");
        let records: Vec<_> = (0..20u32).map(|i| record(i, i as u8)).collect();

        let build = |store: EpochSeedStore| {
            let p = Pipeline::inline(FilterConfig::default());
            let artifact = p.builder.build_artifact(&store.iterate_all()).unwrap();
            artifact.bytes
        };

        {
            let store = EpochSeedStore::open(
                ha_01_epoch_store::FileBackedKVStore::open(&path).unwrap(),
            )
            .unwrap();
            let mut tx = store.begin();
            for r in &records {
                tx.add_record(r);
            }
            tx.commit().unwrap();
        }

        let first = build(
            EpochSeedStore::open(ha_01_epoch_store::FileBackedKVStore::open(&path).unwrap())
                .unwrap(),
        );
        let second = build(
            EpochSeedStore::open(ha_01_epoch_store::FileBackedKVStore::open(&path).unwrap())
                .unwrap(),
        );
        assert_eq!(first, second);
    }
}
