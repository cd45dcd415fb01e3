//! # Product Matcher Tests
//!
//! Behavioural tests for product name correction: the exact, indexed and
//! full scan paths, threshold boundaries, index ambiguity and the invariants
//! every correction must satisfy.

use std::collections::BTreeMap;

use market_ocr::catalog::DEFAULT_PRODUCTS;
use market_ocr::features::{extract_catalog_features, extract_text_features, match_score, Bigram};
use market_ocr::matcher_config::MatcherConfig;
use market_ocr::{Correction, MatchPath, ProductMatcher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Matcher over a custom catalog without substitutions
fn custom_matcher(catalog: &[&str]) -> ProductMatcher {
    let config = MatcherConfig {
        catalog: catalog.iter().map(|s| s.to_string()).collect(),
        substitutions: BTreeMap::new(),
        ..Default::default()
    };
    ProductMatcher::with_config(config).expect("test catalog should be valid")
}

/// Random strings mixing catalog characters, substitution sources and noise
fn random_inputs(seed: u64, count: usize) -> Vec<String> {
    let mut pool: Vec<char> = DEFAULT_PRODUCTS.iter().flat_map(|p| p.chars()).collect();
    pool.extend("锁和任吴胃偶蛙体旺4备帝测试无效商品 ，。!?ab19".chars());

    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(0..12);
            (0..len)
                .map(|_| pool[rng.random_range(0..pool.len())])
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_catalog_entry_is_exact_match() {
        let matcher = ProductMatcher::new();

        for entry in DEFAULT_PRODUCTS {
            let (correction, path) = matcher.correct_with_path(entry);
            assert_eq!(correction.name, entry);
            assert_eq!(correction.confidence, 1.0);
            assert_eq!(path, MatchPath::Exact);
        }
    }

    #[test]
    fn test_exact_match_ignores_spacing_and_punctuation() {
        let matcher = ProductMatcher::new();

        let correction = matcher.correct(" 天使 罐头\t货组。");
        assert_eq!(correction.name, "天使罐头货组");
        assert_eq!(correction.confidence, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let matcher = ProductMatcher::new();

        assert_eq!(matcher.correct(""), Correction::no_match());
        assert_eq!(matcher.correct("   "), Correction::no_match());
        assert_eq!(matcher.correct("\n\t"), Correction::no_match());
    }

    #[test]
    fn test_substitutions_restore_known_confusions() {
        let matcher = ProductMatcher::new();

        let correction = matcher.correct("锁点厨具和任组");
        assert_eq!(correction.name, "锚点厨具货组");
        assert!(correction.confidence >= 0.4);

        let cases = [
            ("悬空吴胃骨雕货组", "悬空鼷兽骨雕货组"),
            ("团结牌口服液偶组", "团结牌口服液货组"),
            ("蛙什卡体石货组", "赛什卡髀石货组"),
            ("硬脑帝头备货组", "硬脑壳头盔货组"),
        ];
        for (input, expected) in cases {
            let correction = matcher.correct(input);
            assert_eq!(correction.name, expected, "input: {}", input);
            assert_eq!(correction.confidence, 1.0, "input: {}", input);
        }
    }

    #[test]
    fn test_substitution_applies_regardless_of_context() {
        let matcher = ProductMatcher::new();

        // 体 -> 髀 also fires inside 星体晶块, leaving only 晶块 and 块货 of
        // the five catalog features once 旺 -> 晶 is fixed
        let (correction, path) = matcher.correct_with_path("星体旺块货组");
        assert_eq!(correction.name, "星体晶块货组");
        assert!((correction.confidence - 0.4).abs() < 1e-9);
        assert_eq!(path, MatchPath::Indexed);
    }

    #[test]
    fn test_digit_four_expands_to_name_fragment() {
        let matcher = ProductMatcher::new();

        let correction = matcher.correct("4货组");
        assert_eq!(correction.name, "星体晶块货组");
        assert_eq!(correction.confidence, 1.0);
    }

    #[test]
    fn test_partial_name_found_through_index() {
        let matcher = ProductMatcher::new();

        // 谷地水培 -> 谷地, 地水, 水培 out of 谷地 地水 水培 培肉 肉货 (谷,肉)
        let (correction, path) = matcher.correct_with_path("谷地水培");
        assert_eq!(correction.name, "谷地水培肉货组");
        assert!((correction.confidence - 0.5).abs() < 1e-9);
        assert_eq!(path, MatchPath::Indexed);
    }

    #[test]
    fn test_garbled_middle_with_noise() {
        let matcher = ProductMatcher::new();

        let correction = matcher.correct("|边角料积x货组");
        assert_eq!(correction.name, "边角料积木货组");
        assert!(correction.confidence >= 0.3);
    }

    #[test]
    fn test_unrelated_text_has_no_match() {
        let matcher = ProductMatcher::new();

        assert_eq!(matcher.correct("测试无效商品"), Correction::no_match());
        assert_eq!(matcher.correct("hello world"), Correction::no_match());
        assert_eq!(matcher.correct("5678"), Correction::no_match());
    }

    #[test]
    fn test_suffix_alone_does_not_match() {
        let matcher = ProductMatcher::new();

        let (correction, path) = matcher.correct_with_path("货组");
        assert_eq!(correction, Correction::no_match());
        assert_eq!(path, MatchPath::NoMatch);
    }

    #[test]
    fn test_ambiguous_bigram_is_not_indexed() {
        let matcher = custom_matcher(&["甲乙丁", "戊甲乙丙"]);
        let shared = Bigram('甲', '乙');

        assert_eq!(matcher.index().lookup(&shared), None);
        assert!(matcher.index().is_ambiguous(&shared));
        assert_eq!(matcher.index().lookup(&Bigram('乙', '丁')), Some(0));
        assert_eq!(matcher.index().lookup(&Bigram('乙', '丙')), Some(1));

        // Only the shared bigram: no fast path, and 1/3 is below the scan threshold
        let (correction, path) = matcher.correct_with_path("甲乙");
        assert_eq!(correction, Correction::no_match());
        assert_eq!(path, MatchPath::NoMatch);

        // A private bigram still nominates its entry
        let (correction, path) = matcher.correct_with_path("甲乙丙子");
        assert_eq!(correction.name, "戊甲乙丙");
        assert!((correction.confidence - 0.5).abs() < 1e-9);
        assert_eq!(path, MatchPath::Indexed);
    }

    #[test]
    fn test_fast_path_takes_first_qualifying_bigram() {
        let matcher = custom_matcher(&["甲乙丙丁", "戊己庚"]);

        // 甲乙 comes first and nominates 甲乙丙丁 at 2/4; 戊己 would score
        // 戊己庚 at 2/3 but is never reached
        let (correction, path) = matcher.correct_with_path("甲乙丙戊己庚");
        assert_eq!(correction.name, "甲乙丙丁");
        assert!((correction.confidence - 0.5).abs() < 1e-9);
        assert_eq!(path, MatchPath::Indexed);

        // Same bigrams in the other order nominate 戊己庚 first
        let (correction, path) = matcher.correct_with_path("戊己庚甲乙丙");
        assert_eq!(correction.name, "戊己庚");
        assert!((correction.confidence - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(path, MatchPath::Indexed);
    }

    #[test]
    fn test_full_scan_matches_through_ambiguous_bigram() {
        let matcher = custom_matcher(&["甲乙", "甲乙丙"]);

        assert_eq!(matcher.index().lookup(&Bigram('甲', '乙')), None);

        let (correction, path) = matcher.correct_with_path("子甲乙");
        assert_eq!(correction.name, "甲乙");
        assert_eq!(correction.confidence, 1.0);
        assert_eq!(path, MatchPath::FullScan);
    }

    #[test]
    fn test_full_scan_first_entry_wins_ties() {
        let config = MatcherConfig {
            catalog: vec!["甲乙丙".to_string(), "丁甲乙".to_string()],
            substitutions: BTreeMap::new(),
            full_scan_threshold: 0.3,
            ..Default::default()
        };
        let matcher = ProductMatcher::with_config(config).unwrap();

        // 甲乙 is shared, both entries score 1/3
        let (correction, path) = matcher.correct_with_path("甲乙");
        assert_eq!(correction.name, "甲乙丙");
        assert!((correction.confidence - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(path, MatchPath::FullScan);
    }

    #[test]
    fn test_fast_path_threshold_boundary() {
        // 100 distinct ideographs: 99 bigrams plus one skip-gram
        let entry: String = (0..100u32)
            .map(|i| char::from_u32(0x4E00 + i).unwrap())
            .collect();
        let matcher = custom_matcher(&[entry.as_str()]);

        // 31 chars -> 30 bigrams -> exactly 0.3
        let at_threshold: String = entry.chars().take(31).collect();
        let (correction, path) = matcher.correct_with_path(&at_threshold);
        assert_eq!(correction.name, entry);
        assert_eq!(correction.confidence, 0.3);
        assert_eq!(path, MatchPath::Indexed);

        // 30 chars -> 29 bigrams -> 0.29, below both thresholds
        let below_threshold: String = entry.chars().take(30).collect();
        let (correction, path) = matcher.correct_with_path(&below_threshold);
        assert_eq!(correction, Correction::no_match());
        assert_eq!(path, MatchPath::NoMatch);
    }

    #[test]
    fn test_custom_thresholds() {
        let config = MatcherConfig {
            fast_path_threshold: 0.9,
            full_scan_threshold: 0.9,
            ..Default::default()
        };
        let strict = ProductMatcher::with_config(config).unwrap();

        // 0.8 passes the defaults but not the strict matcher
        assert_eq!(strict.correct("锁点厨具和任组"), Correction::no_match());
        assert_eq!(ProductMatcher::new().correct("锁点厨具和任组").name, "锚点厨具货组");
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let config = MatcherConfig {
            catalog: vec!["甲".to_string()],
            ..Default::default()
        };
        assert!(ProductMatcher::with_config(config).is_err());
    }

    #[test]
    fn test_results_are_catalog_members_and_bounded() {
        let matcher = ProductMatcher::new();

        for input in random_inputs(7, 2000) {
            let correction = matcher.correct(&input);
            assert!(
                (0.0..=1.0).contains(&correction.confidence),
                "confidence out of range for {:?}: {}",
                input,
                correction.confidence
            );
            if correction.is_match() {
                assert!(matcher.validate_correction(&correction.name), "input: {:?}", input);
                assert!(correction.confidence > 0.0);
            } else {
                assert_eq!(correction.confidence, 0.0);
            }
        }
    }

    #[test]
    fn test_corrections_are_deterministic() {
        let first = ProductMatcher::new();
        let second = ProductMatcher::new();

        for input in random_inputs(11, 500) {
            let a = first.correct_with_path(&input);
            assert_eq!(a, first.correct_with_path(&input));
            assert_eq!(a, second.correct_with_path(&input));
        }
    }

    #[test]
    fn test_match_score_bounds() {
        let suffix = ['货', '组'];
        let inputs = random_inputs(23, 300);

        for query in &inputs {
            let query_features = extract_text_features(query);
            for entry in DEFAULT_PRODUCTS {
                let score = match_score(&query_features, &extract_catalog_features(entry, suffix));
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }

    #[test]
    fn test_batch_matches_single_calls() {
        let matcher = ProductMatcher::new();
        let inputs = random_inputs(3, 100);

        let batch = matcher.batch_correct(&inputs);
        let single: Vec<Correction> = inputs.iter().map(|t| matcher.correct(t)).collect();
        assert_eq!(batch, single);
    }

    #[test]
    fn test_concurrent_corrections() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProductMatcher>();

        let matcher = ProductMatcher::new();
        let inputs = random_inputs(5, 400);
        let expected = matcher.batch_correct(&inputs);

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| matcher.batch_correct(&inputs)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
