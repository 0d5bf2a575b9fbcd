use super::*;
use crate::makedict::layout::{compute_addresses, flatten_tree, relax_pass, BigramTargets};

use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::BTreeMap;

/// Mixes one-byte, three-byte and control characters.
const ALPHABET: &[char] = &['a', 'b', 'c', 'n', 't', 'é', 'ÿ', '中', '\u{1F}', '\u{1F600}'];

type Entry = (String, u32, Vec<(Index, u8)>);

fn word_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(ALPHABET), 1..8)
        .prop_map(|chars| chars.into_iter().collect())
}

fn entries_strategy() -> impl Strategy<Value = Vec<Entry>> {
    let entry = (
        word_strategy(),
        0u32..=255,
        prop::collection::vec((any::<Index>(), 0u8..=15), 0..3),
    );
    prop::collection::vec(entry, 0..300)
}

/// Builds a dictionary, pointing associated words at other listed words.
fn build(entries: Vec<Entry>) -> FusionDictionary {
    let mut unique: BTreeMap<String, (u32, Vec<(Index, u8)>)> = BTreeMap::new();
    for (word, frequency, bigrams) in entries {
        unique.entry(word).or_insert((frequency, bigrams));
    }
    let words: Vec<String> = unique.keys().cloned().collect();

    let mut dict = FusionDictionary::new();
    for (word, (frequency, bigrams)) in &unique {
        let bigrams = bigrams
            .iter()
            .map(|(index, f)| WeightedString::new(index.get(&words).clone(), *f))
            .collect();
        dict.add(word, *frequency, bigrams).unwrap();
    }
    dict
}

fn layout_snapshot(dict: &FusionDictionary, flat: &[NodeId]) -> Vec<Node> {
    flat.iter().map(|&id| dict.node(id).clone()).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_binary_round_trip(entries in entries_strategy()) {
        let mut dict = build(entries);
        let bytes = to_bytes(&mut dict).unwrap();
        let read = from_bytes(&bytes).unwrap();

        let expected: Vec<Word> = dict.iter().collect();
        let actual: Vec<Word> = read.iter().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(read.count_char_groups(), dict.count_char_groups());
    }

    #[test]
    fn prop_passes_only_shrink(entries in entries_strategy()) {
        let mut dict = build(entries);
        let flat = flatten_tree(&dict);
        let report = compute_addresses(&mut dict, &flat).unwrap();

        prop_assert!(report.final_size <= report.initial_size);
        let mut previous = report.initial_size;
        for &size in &report.pass_sizes {
            prop_assert!(size <= previous, "pass grew from {} to {}", previous, size);
            previous = size;
        }
        prop_assert_eq!(report.pass_sizes.last().copied(), Some(report.final_size));
    }

    #[test]
    fn prop_fixed_point_is_stable(entries in entries_strategy()) {
        let mut dict = build(entries);
        let flat = flatten_tree(&dict);
        let targets = BigramTargets::resolve(&dict, &flat).unwrap();
        layout::compute_addresses_with(&mut dict, &flat, &targets).unwrap();

        let before = layout_snapshot(&dict, &flat);
        prop_assert!(!relax_pass(&mut dict, &flat, &targets).unwrap());
        prop_assert_eq!(&layout_snapshot(&dict, &flat), &before);

        // Starting over from the worst case lands on the same layout.
        compute_addresses(&mut dict, &flat).unwrap();
        prop_assert_eq!(&layout_snapshot(&dict, &flat), &before);
    }
}
