//! Leaderboard document model and merge/ranking rules.
//!
//! A board is a plain mapping from category name ("Money", "Speed", ...) to a
//! list of entries kept sorted descending by value. Scores arrive over HTTP
//! as arbitrary JSON, so values are stored as raw [`Value`]s and only compared
//! numerically when both sides actually are numbers.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How many entries a rendered leaderboard shows. Storage is uncapped.
pub const DISPLAY_LIMIT: usize = 50;

/// Category name -> ranked entries.
pub type Board = BTreeMap<String, Vec<Entry>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl Entry {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Descending by numeric value. Pairs that are not both numeric compare as
/// equal, so the surrounding stable sort leaves their relative order alone.
fn cmp_desc(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

fn sort_desc(entries: &mut [Entry]) {
    entries.sort_by(|a, b| cmp_desc(&a.value, &b.value));
}

/// Overwrite the value on an exact name match, else append; then re-sort.
///
/// The stable sort means equal-value entries keep their prior relative order
/// on this path.
pub fn upsert_entry(board: &mut Board, kind: &str, name: &str, value: Value) {
    let entries = board.entry(kind.to_string()).or_default();
    match entries.iter_mut().find(|e| e.name == name) {
        Some(entry) => entry.value = value,
        None => entries.push(Entry::new(name, value)),
    }
    sort_desc(entries);
}

/// Merge a batch of entries into one category.
///
/// The category is rebuilt from a name-keyed association: existing names keep
/// their prior order, new names follow in batch order, then the whole list is
/// re-sorted. A name present on both sides keeps the larger value when both
/// are numeric; otherwise the incoming value wins. Nameless entries are
/// discarded.
pub fn merge_batch(board: &mut Board, kind: &str, incoming: Vec<Entry>) {
    let existing = board.remove(kind).unwrap_or_default();

    let mut merged: Vec<Entry> = Vec::with_capacity(existing.len() + incoming.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(existing.len());

    for entry in existing.into_iter().chain(incoming) {
        if entry.name.is_empty() {
            continue;
        }
        match index.get(&entry.name) {
            Some(&at) => {
                merged[at].value = merge_value(&merged[at].value, entry.value);
            }
            None => {
                index.insert(entry.name.clone(), merged.len());
                merged.push(entry);
            }
        }
    }

    sort_desc(&mut merged);
    board.insert(kind.to_string(), merged);
}

fn merge_value(old: &Value, new: Value) -> Value {
    match (old.as_f64(), new.as_f64()) {
        (Some(x), Some(y)) if x >= y => old.clone(),
        _ => new,
    }
}

/// Top slice of a category for display. The stored list keeps every entry.
pub fn ranked<'a>(board: &'a Board, kind: &str) -> &'a [Entry] {
    let entries = board.get(kind).map(Vec::as_slice).unwrap_or(&[]);
    &entries[..entries.len().min(DISPLAY_LIMIT)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn upsert_inserts_sorted_descending() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(10));
        upsert_entry(&mut board, "Money", "bob", json!(30));
        upsert_entry(&mut board, "Money", "carol", json!(20));

        assert_eq!(names(&board["Money"]), vec!["bob", "carol", "alice"]);
    }

    #[test]
    fn upsert_overwrites_value_for_existing_name() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(100));
        upsert_entry(&mut board, "Money", "alice", json!(50));

        assert_eq!(board["Money"].len(), 1);
        assert_eq!(board["Money"][0].value, json!(50));
    }

    #[test]
    fn upsert_keeps_tied_entries_in_prior_order() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Speed", "first", json!(7));
        upsert_entry(&mut board, "Speed", "second", json!(7));
        upsert_entry(&mut board, "Speed", "third", json!(7));
        // Re-applying the same value must not shuffle the ties.
        upsert_entry(&mut board, "Speed", "second", json!(7));

        assert_eq!(names(&board["Speed"]), vec!["first", "second", "third"]);
    }

    #[test]
    fn merge_takes_max_of_numeric_values() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(5));
        merge_batch(&mut board, "Money", vec![Entry::new("alice", json!(3))]);
        assert_eq!(board["Money"][0].value, json!(5));

        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(3));
        merge_batch(&mut board, "Money", vec![Entry::new("alice", json!(5))]);
        assert_eq!(board["Money"][0].value, json!(5));
    }

    #[test]
    fn merge_dedupes_names_within_one_batch() {
        let mut board = Board::default();
        merge_batch(
            &mut board,
            "Speed",
            vec![
                Entry::new("bob", json!(10)),
                Entry::new("bob", json!(20)),
            ],
        );

        assert_eq!(board["Speed"].len(), 1);
        assert_eq!(board["Speed"][0].value, json!(20));
    }

    #[test]
    fn merge_lets_incoming_win_when_values_are_not_comparable() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!("a lot"));
        merge_batch(&mut board, "Money", vec![Entry::new("alice", json!(1))]);
        assert_eq!(board["Money"][0].value, json!(1));

        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(99));
        merge_batch(&mut board, "Money", vec![Entry::new("alice", json!("?"))]);
        assert_eq!(board["Money"][0].value, json!("?"));
    }

    #[test]
    fn merge_discards_nameless_entries() {
        let mut board = Board::default();
        merge_batch(
            &mut board,
            "Money",
            vec![Entry::new("", json!(999)), Entry::new("alice", json!(1))],
        );

        assert_eq!(names(&board["Money"]), vec!["alice"]);
    }

    #[test]
    fn merge_keeps_untouched_entries() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!(10));
        upsert_entry(&mut board, "Money", "bob", json!(20));
        merge_batch(&mut board, "Money", vec![Entry::new("carol", json!(15))]);

        assert_eq!(names(&board["Money"]), vec!["bob", "carol", "alice"]);
    }

    #[test]
    fn non_numeric_values_keep_insertion_order() {
        let mut board = Board::default();
        upsert_entry(&mut board, "Money", "alice", json!("fast"));
        upsert_entry(&mut board, "Money", "bob", json!("slow"));

        assert_eq!(names(&board["Money"]), vec!["alice", "bob"]);
    }

    #[test]
    fn ranked_caps_display_but_storage_keeps_everything() {
        let mut board = Board::default();
        for i in 0..51 {
            upsert_entry(&mut board, "Money", &format!("p{i}"), json!(i));
        }

        assert_eq!(ranked(&board, "Money").len(), DISPLAY_LIMIT);
        assert_eq!(board["Money"].len(), 51);
        // Capped slice is the top of the ranking.
        assert_eq!(ranked(&board, "Money")[0].value, json!(50));
    }

    #[test]
    fn ranked_unknown_category_is_empty() {
        let board = Board::default();
        assert!(ranked(&board, "Nope").is_empty());
    }
}
