#![allow(dead_code)]

use vocab_store::Entry;

pub fn entry(phrase: &str, translation: &str) -> Entry {
    Entry::new(phrase, translation)
}

/// Five distinct Spanish entries, `uno` through `cinco`.
pub fn numbers() -> Vec<Entry> {
    [
        ("uno", "one"),
        ("dos", "two"),
        ("tres", "three"),
        ("cuatro", "four"),
        ("cinco", "five"),
    ]
    .into_iter()
    .map(|(p, t)| entry(p, t))
    .collect()
}

pub fn counted(phrase: &str, translation: &str, tried: u32, failed: u32) -> Entry {
    Entry {
        times_tried: tried,
        times_failed: failed,
        ..Entry::new(phrase, translation)
    }
}
