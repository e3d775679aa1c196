use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Keys over a small alphabet so prefixes and shared paths are common.
fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'é', 'あ', '😀', '\0']), 0..8)
        .prop_map(|chars| chars.into_iter().collect())
}

fn key_set_strategy() -> impl Strategy<Value = BTreeMap<String, u32>> {
    prop::collection::btree_map(key_strategy(), 0u32..1_000_000, 0..64)
}

fn build(model: &BTreeMap<String, u32>, capacity: usize) -> Trie<i32> {
    let mut builder = Builder::<i32>::with_capacity(capacity);
    // reversed so the builder has to sort
    for (k, &v) in model.iter().rev() {
        builder.append(k, v);
    }
    builder.build().unwrap()
}

proptest! {
    #[test]
    fn every_key_round_trips(model in key_set_strategy()) {
        let trie = build(&model, 0);
        for (k, &v) in &model {
            prop_assert_eq!(trie.lookup(k.as_str()), Some(v), "key {:?}", k);
            prop_assert!(trie.contains(k.as_str()));
        }
    }

    #[test]
    fn absent_keys_are_not_found(model in key_set_strategy(), other in key_strategy()) {
        let trie = build(&model, 0);
        prop_assert_eq!(trie.lookup(other.as_str()), model.get(&other).copied());
        prop_assert_eq!(trie.contains(other.as_str()), model.contains_key(&other));
    }

    #[test]
    fn prefix_search_matches_model(model in key_set_strategy(), query in key_strategy()) {
        let trie = build(&model, 0);
        let mut expected: Vec<(String, u32)> = model
            .iter()
            .filter(|(k, _)| !k.is_empty() && query.starts_with(k.as_str()))
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        expected.sort_by_key(|(k, _)| k.len());
        let actual: Vec<(String, u32)> = trie
            .common_prefix_search(query.as_str())
            .map(|m| (m.key, m.record.unwrap()))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn growth_is_invisible(model in key_set_strategy()) {
        let small = build(&model, 2);
        let large = build(&model, 1 << 14);
        prop_assert_eq!(small.size(), large.size());
        for k in model.keys() {
            prop_assert_eq!(small.lookup(k.as_str()), large.lookup(k.as_str()));
        }
    }

    #[test]
    fn shrink_is_minimal(model in key_set_strategy()) {
        let trie = build(&model, 0);
        let check = trie.check_buffer();
        let n = check.len();
        prop_assert!(check[n - 1] < 0);
        prop_assert!(check[n - 2] >= 0);
    }

    #[test]
    fn loaded_buffers_answer_identically(model in key_set_strategy()) {
        let trie = build(&model, 0);
        let loaded = Trie::load(trie.base_buffer().to_vec(), trie.check_buffer().to_vec());
        for (k, &v) in &model {
            prop_assert_eq!(loaded.lookup(k.as_str()), Some(v));
        }
    }

    #[test]
    fn codec_round_trips(s in ".*") {
        prop_assert_eq!(codec::decode(&codec::encode(&s)), s.clone());
        let units: Vec<u16> = s.encode_utf16().collect();
        prop_assert_eq!(codec::decode_utf16(&codec::encode_utf16(&units).unwrap()), units);
    }
}
