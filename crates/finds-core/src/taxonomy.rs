//! Controlled category taxonomy and the free-form → canonical mapping.
//!
//! `categories` stores whatever the extraction produced; the canonical
//! derivative drives navigation and search and only ever contains values
//! from the fixed list below. Unrecognised inputs are dropped, never passed
//! through.

use std::collections::BTreeSet;

/// The closed canonical taxonomy. Grows over time, by hand.
pub const CANONICAL_CATEGORIES: &[&str] = &[
  "badminton",
  "cafe",
  "chess",
  "climbing",
  "escape room",
  "family",
  "football",
  "gym",
  "martial arts",
  "padel",
  "pickleball",
  "pilates",
  "restaurant",
  "spa",
  "squash",
  "swimming",
  "table_tennis",
  "tennis",
  "yoga",
];

/// Many-to-one synonym table; keys are lowercased, trimmed strings.
fn synonym(raw: &str) -> Option<&'static str> {
  let canonical = match raw {
    // Racquet sports
    "paddle tennis" | "padel tennis" => "padel",
    "glass-back squash" => "squash",
    "ping pong" => "table_tennis",

    // Swimming
    "swimming pool" | "indoor pool" | "outdoor pool" | "aqua aerobics" => "swimming",

    // Spa and wellness
    "wellness" | "sauna" | "steam room" | "hydro pool" | "hot tub" | "spa retreat" => "spa",

    // Family and kids programmes
    "creche" | "childcare" | "kids" | "kids club" | "junior" | "holiday club" => "family",

    // Food and drink
    "dining" => "restaurant",
    "coffee" => "cafe",

    // Football formats
    "5-a-side football" | "7-a-side football" => "football",

    _ => return None,
  };
  Some(canonical)
}

pub fn is_canonical(category: &str) -> bool {
  CANONICAL_CATEGORIES.contains(&category)
}

/// Map free-form extracted category strings onto the canonical taxonomy.
///
/// Each input is trimmed and lowercased, then resolved through the synonym
/// table or by direct membership in the canonical set. Anything else is
/// dropped silently. The result is deduplicated and sorted so repeated runs
/// compare equal.
pub fn map_categories<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
  let mut mapped = BTreeSet::new();

  for item in raw {
    let key = item.as_ref().trim().to_lowercase();
    if key.is_empty() {
      continue;
    }
    if let Some(canonical) = synonym(&key) {
      mapped.insert(canonical.to_string());
    } else if is_canonical(&key) {
      mapped.insert(key);
    }
  }

  mapped.into_iter().collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn synonyms_collapse_case_insensitively() {
    let raw = ["Padel", "PADEL", "paddle tennis", "unknown_sport_xyz"];
    assert_eq!(map_categories(&raw), vec!["padel"]);
  }

  #[test]
  fn unknown_categories_are_dropped() {
    let raw = ["quidditch", "underwater hockey"];
    assert!(map_categories(&raw).is_empty());
  }

  #[test]
  fn output_is_sorted_and_deduplicated() {
    let raw = ["tennis", "gym", "sauna", "steam room", "Tennis"];
    assert_eq!(map_categories(&raw), vec!["gym", "spa", "tennis"]);
  }

  #[test]
  fn every_synonym_target_is_canonical() {
    // The closure property: mapping can never emit a value outside the
    // canonical set, whatever the input.
    let raw = [
      "paddle tennis", "ping pong", "swimming pool", "wellness", "creche",
      "dining", "coffee", "5-a-side football", "glass-back squash",
    ];
    for mapped in map_categories(&raw) {
      assert!(is_canonical(&mapped), "{mapped} escaped the taxonomy");
    }
  }

  #[test]
  fn whitespace_is_trimmed() {
    assert_eq!(map_categories(&["  Tennis  "]), vec!["tennis"]);
  }
}
