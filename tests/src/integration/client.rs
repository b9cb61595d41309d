//! # Client Matching
//!
//! A client keeps the ephemeral identifiers it observed per epoch, downloads
//! the filter and tests each observation. Matches happen exactly for the
//! identifiers derived from disclosed seeds.

#[cfg(test)]
mod tests {
    use crate::fixtures::{random_records, Pipeline};
    use chrono::{DateTime, TimeZone, Utc};
    use ha_02_contagion_filter::{FilterConfig, FilterKind};
    use ha_04_distribution::DistributionApi;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_types::{
        epoch_for, epoch_start, ephid_for_seed, ClientEpochStore, EphId, Epoch,
        InMemoryClientEpochStore, EPHID_LENGTH,
    };

    #[test]
    fn test_client_default_timestamp() {
        let client = InMemoryClientEpochStore::new();
        assert_eq!(client.last_ephid_change(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(epoch_for(client.last_ephid_change()).unwrap(), Epoch(0));
    }

    #[test]
    fn test_client_rotation_follows_server_epochs() {
        let client = InMemoryClientEpochStore::new();
        let now = Utc.with_ymd_and_hms(2020, 4, 1, 12, 7, 0).unwrap();
        assert!(client.needs_rotation(now).unwrap());

        client.record_ephid_change(now);
        assert!(!client.needs_rotation(now).unwrap());

        let next = epoch_start(Epoch(epoch_for(now).unwrap().as_u32() + 1));
        assert!(client.needs_rotation(next).unwrap());
    }

    #[test]
    fn test_observed_identifiers_match() {
        let p = Pipeline::inline(FilterConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        let disclosed = random_records(&mut rng, 2_000, 64);
        p.ingestion.commit_batch(p.batch(disclosed.clone())).unwrap();

        let filter = p.distribution.get_filter().decode_filter().unwrap();
        for r in &disclosed {
            let observed = ephid_for_seed(&r.seed);
            assert!(filter.contains_observation(r.epoch, &observed));
        }

        // Same identifier seen in a different epoch is not a contact
        let r = &disclosed[0];
        let elsewhere = Epoch(r.epoch.as_u32() + 10_000);
        assert!(!filter.contains_observation(elsewhere, &ephid_for_seed(&r.seed)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_no_false_negatives(seed in any::<u64>(), count in 1usize..200, bloom in any::<bool>()) {
            let kind = if bloom { FilterKind::Bloom } else { FilterKind::Cuckoo };
            let p = Pipeline::inline(FilterConfig::default().with_kind(kind));
            let mut rng = StdRng::seed_from_u64(seed);
            let records = random_records(&mut rng, 0, count);
            p.ingestion.commit_batch(p.batch(records.clone())).unwrap();

            let filter = p.distribution.get_filter().decode_filter().unwrap();
            for r in &records {
                prop_assert!(filter.contains_observation(r.epoch, &ephid_for_seed(&r.seed)));
            }
        }

        #[test]
        fn prop_unrelated_identifiers_rarely_match(seed in any::<u64>()) {
            let p = Pipeline::inline(FilterConfig::default());
            let mut rng = StdRng::seed_from_u64(seed);
            let records = random_records(&mut rng, 0, 100);
            p.ingestion.commit_batch(p.batch(records)).unwrap();
            let filter = p.distribution.get_filter().decode_filter().unwrap();

            let mut matches = 0;
            for i in 0..1_000u32 {
                let mut id = [0u8; EPHID_LENGTH];
                id[..4].copy_from_slice(&i.to_le_bytes());
                id[4..8].copy_from_slice(&seed.to_le_bytes()[..4]);
                if filter.contains_observation(Epoch(i % 100), &EphId(id)) {
                    matches += 1;
                }
            }
            prop_assert!(matches < 50, "{} false positives out of 1000", matches);
        }
    }
}
