//! Mod descriptor handling
//!
//! A workshop item ships two small records next to its assets, `mod.info`
//! (the map names) and `modmeta.info` (key/value metadata). The server on
//! the other hand wants a single `.mod` record, see [`writer`] for its
//! layout. All strings are [`crate::ue4`] strings.
//!
//! ## mod.info
//!
//! | Type     | Name      | Description |
//! | -------: | --------- | ----------- |
//! | FString  | mod name  | Unused |
//! | i32      | map count | |
//! | FString  | map name  | Repeated `map count` times, first is the primary map |
//!
//! ## modmeta.info
//!
//! | Type     | Name       | Description |
//! | -------: | ---------- | ----------- |
//! | i32      | pair count | |
//! | FString  | key        | Repeated `pair count` times |
//! | FString  | value      | |
use std::collections::HashMap;

pub mod reader;
pub mod writer;

pub use reader::{read_base_info, read_base_info_file, read_meta_data, read_meta_data_file};
pub use writer::{write_descriptor, write_descriptor_file, ModDescriptor};

pub const BASE_INFO_FILE: &str = "mod.info";
pub const META_DATA_FILE: &str = "modmeta.info";
pub const DESCRIPTOR_FILE: &str = ".mod";

/// Insertion ordered string map, re-inserting a key keeps its slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaData {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl MetaData {
    pub fn new() -> Self {
        MetaData::default()
    }

    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetaData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut meta = MetaData::new();
        for (k, v) in iter {
            meta.insert(k.into(), v.into());
        }
        meta
    }
}

#[cfg(test)]
mod test_meta_data {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let meta: MetaData = [("Zeta", "1"), ("Alpha", "2"), ("Mid", "3")]
            .into_iter()
            .collect();

        let keys: Vec<&str> = meta.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn overwrite_in_place() {
        let mut meta = MetaData::new();
        meta.insert("ModType".into(), "1".into());
        meta.insert("Author".into(), "someone".into());

        assert_eq!(meta.insert("ModType".into(), "2".into()), Some("1".into()));
        assert_eq!(meta.len(), 2);
        assert_eq!(
            meta.iter().collect::<Vec<_>>(),
            vec![("ModType", "2"), ("Author", "someone")]
        );
    }

    #[test]
    fn lookup() {
        let meta: MetaData = [("ModType", "1")].into_iter().collect();

        assert!(meta.contains_key("ModType"));
        assert!(!meta.contains_key("modtype"));
        assert_eq!(meta.get("ModType"), Some("1"));
        assert_eq!(meta.get("Nope"), None);
        assert!(!meta.is_empty());
    }
}
