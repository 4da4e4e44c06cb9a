//! Property-based tests for filename decoding, timing and set overlap

use proptest::prelude::*;
use rowpress_ingest::experiment::ExperimentKind;
use rowpress_ingest::grammar::{decode_filename, DecodedFilename, FilenameParameters};
use rowpress_ingest::record::FlipSite;
use rowpress_ingest::relation::overlap;
use rowpress_ingest::timing;
use std::collections::BTreeSet;

fn params_strategy() -> impl Strategy<Value = FilenameParameters> {
    let ratio = (0u32..=100).prop_map(|p| f64::from(p) / 100.0);
    prop_oneof![
        (0u64..1_000_000, 0u64..100_000, 1u64..1000).prop_map(|(hc, ras, atk)| {
            FilenameParameters::Ber {
                hammer_count: hc,
                ras_scale: ras,
                attack_time_ms: atk,
            }
        }),
        (0u64..1_000_000).prop_map(|ras| FilenameParameters::HcFirst { ras_scale: ras }),
        (0u64..100_000).prop_map(|w| FilenameParameters::RetentionFailure { wait_time_ms: w }),
        (1u64..1_000_000).prop_map(|ac| FilenameParameters::MinTaggon {
            activation_count: ac
        }),
        (0u64..100_000, 0u64..10_000, ratio.clone()).prop_map(|(hc, delay, ratio)| {
            FilenameParameters::FaBer {
                hammer_count: hc,
                extra_delay: delay,
                ratio,
            }
        }),
        (0u64..100_000, 0u64..10_000, ratio, 1u64..1000).prop_map(
            |(hc, delay, ratio, atk)| FilenameParameters::FtBer {
                hammer_count: hc,
                extra_delay: delay,
                ratio,
                attack_time_ms: atk,
            }
        ),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_filename_decodes_what_it_encodes(
        module in "[A-Za-z][A-Za-z0-9]{0,7}",
        params in params_strategy(),
        iteration in 0u32..100,
        ext in prop::sample::select(vec!["", ".log", ".csv"]),
    ) {
        let name = DecodedFilename { module, params, iteration };
        let filename = format!("{}{}", name.encode(), ext);
        let decoded = decode_filename(params.kind(), &filename).unwrap();
        prop_assert_eq!(decoded, name);
    }

    #[test]
    fn prop_filename_rejects_wrong_token_count(
        ras in 0u64..1000,
        iteration in 0u32..10,
    ) {
        // an HCFIRST name never has the token count of a BER name
        let filename = format!("S0_{}_itr{}.log", ras, iteration);
        prop_assert!(decode_filename(ExperimentKind::Ber, &filename).is_err());
    }

    #[test]
    fn prop_hammer_count_fits_budget(
        rows in 1u64..64,
        ras in 0u64..2000,
        rp in 0u64..100,
        budget in 1.0f64..500.0,
    ) {
        let hc = timing::hammer_count_for_budget(rows, ras, rp, budget);
        prop_assert!(timing::program_time_ms(rows, ras, rp, hc) <= budget + timing::BUDGET_TOLERANCE_MS + 1e-9);
        let next = timing::program_time_ms(rows, ras, rp, hc + 1);
        prop_assert!(next > budget + timing::BUDGET_TOLERANCE_MS - 1e-9);
    }

    #[test]
    fn prop_no_rows_means_no_hammers(ras in 0u64..2000, budget in 0.0f64..500.0) {
        prop_assert_eq!(timing::hammer_count_for_budget(0, ras, 0, budget), 0);
    }

    #[test]
    fn prop_t_agg_on_is_monotonic(ras in 0u64..1_000_000) {
        let t = timing::t_agg_on_ns(ras).unwrap();
        prop_assert!(timing::t_agg_on_ns(ras + 1).unwrap() > t);
        prop_assert_eq!(t % 6, 0);
    }

    #[test]
    fn prop_overlap_bounded_by_both_sets(
        a in prop::collection::btree_set((0u64..4, -2i64..3, 0u64..64), 0..40),
        b in prop::collection::btree_set((0u64..4, -2i64..3, 0u64..64), 0..40),
    ) {
        let to_sites = |set: BTreeSet<(u64, i64, u64)>| -> BTreeSet<FlipSite> {
            set.into_iter()
                .map(|(pivot_row, row_offset, linear_bit_index)| FlipSite {
                    pivot_row,
                    row_offset,
                    linear_bit_index,
                })
                .collect()
        };
        let (a, b) = (to_sites(a), to_sites(b));
        let n = overlap(&a, &b);
        prop_assert!(n <= a.len().min(b.len()));
        prop_assert_eq!(n, overlap(&b, &a));
        prop_assert_eq!(overlap(&a, &a), a.len());
    }
}
