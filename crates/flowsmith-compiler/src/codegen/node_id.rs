//! Diagram node ids
//!
//! Maps semantic names to diagram-safe ids. Distinct names never share an
//! id: a sanitized id that is too long, starts badly, is a diagram keyword or
//! is already owned falls back to a content hash.

use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Longest sanitized id used verbatim
pub const MAX_ID_LEN: usize = 30;

const HASH_PREFIX_LEN: usize = 6;

const RESERVED_IDS: &[&str] = &[
    "end",
    "graph",
    "flowchart",
    "subgraph",
    "style",
    "class",
    "classdef",
    "click",
    "direction",
    "linkstyle",
];

/// Replace every character outside `[A-Za-z0-9_]` with `_`
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Allocates one stable id per semantic name
#[derive(Debug, Default)]
pub struct NodeIdAllocator {
    by_name: HashMap<String, String>,
    owners: HashMap<String, String>,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, allocating one on first use
    pub fn id_for(&mut self, name: &str) -> String {
        if let Some(id) = self.by_name.get(name) {
            return id.clone();
        }

        let clean = sanitize(name);
        let usable = !clean.is_empty()
            && clean.len() <= MAX_ID_LEN
            && !clean.starts_with(|c: char| c.is_ascii_digit() || c == '_')
            && !RESERVED_IDS.contains(&clean.to_ascii_lowercase().as_str())
            && !self.owners.contains_key(&clean);

        let id = if usable { clean } else { self.hashed(name) };

        self.owners.insert(id.clone(), name.to_string());
        self.by_name.insert(name.to_string(), id.clone());
        id
    }

    fn hashed(&self, name: &str) -> String {
        let digest = Sha256::digest(name.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        let mut len = HASH_PREFIX_LEN;
        while len <= hex.len() {
            let id = format!("node_{}", &hex[..len]);
            if !self.owners.contains_key(&id) {
                return id;
            }
            len += 2;
        }

        let mut counter = 1usize;
        loop {
            let id = format!("node_{}_{}", hex, counter);
            if !self.owners.contains_key(&id) {
                return id;
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_ids() {
        let mut ids = NodeIdAllocator::new();
        assert_eq!(ids.id_for("call:MAIN:ALIGN"), "call_MAIN_ALIGN");
        assert_eq!(ids.id_for("call:MAIN:ALIGN"), "call_MAIN_ALIGN");
    }

    #[test]
    fn test_collision_forces_hash() {
        let mut ids = NodeIdAllocator::new();
        let first = ids.id_for("var:a.b");
        let second = ids.id_for("var:a_b");

        assert_eq!(first, "var_a_b");
        assert!(second.starts_with("node_"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_long_or_bad_names_hash() {
        let mut ids = NodeIdAllocator::new();
        assert!(ids.id_for(&"x".repeat(MAX_ID_LEN + 1)).starts_with("node_"));
        assert!(ids.id_for("1reads").starts_with("node_"));
        assert!(ids.id_for("_reads").starts_with("node_"));
        assert!(ids.id_for("end").starts_with("node_"));
    }
}
