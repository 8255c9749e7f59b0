//! Tolerant field access over fetched JSON documents.
//!
//! API documents are treated as loosely-shaped trees: a missing or mistyped
//! field reads as `None` (or an empty slice) instead of failing.

use serde_json::Value;

/// Read-only accessors for nested JSON fields.
pub trait DocExt {
    /// Follow a chain of object keys.
    fn at(&self, path: &[&str]) -> Option<&Value>;

    /// String at `path`, if present and a string.
    fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.at(path).and_then(Value::as_str)
    }

    /// Integer at `path`, if present and integral.
    fn i64_at(&self, path: &[&str]) -> Option<i64> {
        self.at(path).and_then(Value::as_i64)
    }

    /// Boolean at `path`; missing or non-boolean reads as `false`.
    fn flag(&self, path: &[&str]) -> bool {
        self.at(path).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Array at `path`; missing or non-array reads as empty.
    fn items(&self, path: &[&str]) -> &[Value] {
        self.at(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when `path` is absent or JSON `null`.
    fn is_null_at(&self, path: &[&str]) -> bool {
        self.at(path).map_or(true, Value::is_null)
    }
}

impl DocExt for Value {
    fn at(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }
}

/// Base stat named `stat` from a Pokémon's `stats` list.
///
/// Only the first matching entry counts.
pub fn base_stat(pokemon: &Value, stat: &str) -> Option<i64> {
    pokemon
        .items(&["stats"])
        .iter()
        .find(|entry| entry.str_at(&["stat", "name"]) == Some(stat))
        .and_then(|entry| entry.i64_at(&["base_stat"]))
}

/// Name of the default variety of a species, if one is marked.
pub fn default_variety(species: &Value) -> Option<&str> {
    species
        .items(&["varieties"])
        .iter()
        .find(|variety| variety.flag(&["is_default"]))
        .and_then(|variety| variety.str_at(&["pokemon", "name"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_access() {
        let doc = json!({ "generation": { "name": "generation-i" }, "height": 7 });
        assert_eq!(doc.str_at(&["generation", "name"]), Some("generation-i"));
        assert_eq!(doc.i64_at(&["height"]), Some(7));
        assert_eq!(doc.str_at(&["habitat", "name"]), None);
        assert_eq!(doc.i64_at(&["generation"]), None);
    }

    #[test]
    fn test_null_intermediate() {
        let doc = json!({ "habitat": null, "evolves_from_species": null });
        assert_eq!(doc.str_at(&["habitat", "name"]), None);
        assert!(doc.is_null_at(&["evolves_from_species"]));
        assert!(doc.is_null_at(&["missing"]));
    }

    #[test]
    fn test_items_and_flags() {
        let doc = json!({ "results": "oops", "is_legendary": true });
        assert!(doc.items(&["results"]).is_empty());
        assert!(doc.items(&["absent"]).is_empty());
        assert!(doc.flag(&["is_legendary"]));
        assert!(!doc.flag(&["is_mythical"]));
    }

    #[test]
    fn test_base_stat_first_match() {
        let pokemon = json!({
            "stats": [
                { "base_stat": 45, "stat": { "name": "hp" } },
                { "base_stat": 49, "stat": { "name": "attack" } },
                { "base_stat": 99, "stat": { "name": "attack" } }
            ]
        });
        assert_eq!(base_stat(&pokemon, "attack"), Some(49));
        assert_eq!(base_stat(&pokemon, "speed"), None);
    }

    #[test]
    fn test_default_variety() {
        let species = json!({
            "varieties": [
                { "is_default": false, "pokemon": { "name": "pikachu-gmax" } },
                { "is_default": true, "pokemon": { "name": "pikachu" } }
            ]
        });
        assert_eq!(default_variety(&species), Some("pikachu"));
        assert_eq!(default_variety(&json!({})), None);
    }
}
