//! The confidence gate and the deep merge engine.
//!
//! Scalar fields pass through the confidence gate: a differing value wins
//! only when it is more certain than what is on file, or crosses an
//! absolute certainty bar. Composite fields (lists, nested objects) merge
//! additively instead — nested data carries no per-key confidence signal,
//! so it is treated as fill-once / append-only.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::{confidence::FieldConfidence, registry::FieldSpec};

/// Minimum confidence at which a differing value may replace the stored one
/// regardless of the stored confidence. The boundary is inclusive.
pub const CHANGE_MIN_CONF: f64 = 0.7;

type JsonMap = Map<String, Value>;

// ─── Scalar gate ─────────────────────────────────────────────────────────────

/// JSON equality with numbers compared as `f64`, so `55` and `55.0` (which
/// round-trip differently through JSON text) count as the same value.
pub fn values_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
    _ => a == b,
  }
}

/// Apply the overwrite rule to a single scalar field.
///
/// Returns `true` iff the stored value changed.
///
/// A reaffirmed value (new equals old) only ever raises the stored
/// confidence. A differing value wins iff `new_conf > old_conf` or
/// `new_conf >= CHANGE_MIN_CONF`; on winning, the stored confidence becomes
/// `new_conf` — even when that is *lower* than the previous score. Two
/// sources at exactly the threshold with different values will therefore
/// flip-flop the stored value on alternating upserts. That behaviour is
/// intentional and pinned by tests; do not "fix" it here.
pub fn apply_scalar_field(
  map: &mut JsonMap,
  conf: &mut FieldConfidence,
  field: &str,
  new_value: &Value,
  new_conf: f64,
) -> bool {
  let old_value = map.get(field).cloned().unwrap_or(Value::Null);
  let old_conf = conf.get(field);

  if values_equal(&old_value, new_value) {
    conf.set(field, old_conf.max(new_conf));
    return false;
  }

  if new_conf > old_conf || new_conf >= CHANGE_MIN_CONF {
    map.insert(field.to_string(), new_value.clone());
    conf.set(field, new_conf);
    return true;
  }

  false
}

// ─── Field-set application ───────────────────────────────────────────────────

/// Apply a set of incoming fields onto a sub-record's field map.
///
/// Each field is evaluated independently: scalar kinds pass through the
/// confidence gate; composite kinds merge additively, with their stored
/// confidence raised to the higher of old and new. Returns the names of
/// fields whose stored value actually changed.
pub fn apply_updates(
  map: &mut JsonMap,
  conf: &mut FieldConfidence,
  specs: &[FieldSpec],
  updates: &JsonMap,
  incoming_conf: &FieldConfidence,
) -> Vec<String> {
  let mut changed = Vec::new();

  for (field, value) in updates {
    let Some(spec) = specs.iter().find(|s| s.name == field.as_str()) else {
      continue;
    };
    let new_conf = incoming_conf.get(field);

    let field_changed = if spec.kind.is_composite() {
      apply_composite_field(map, conf, field, value, new_conf)
    } else {
      apply_scalar_field(map, conf, field, value, new_conf)
    };

    if field_changed {
      changed.push(field.clone());
    }
  }

  changed
}

/// Additively merge one composite field, reporting whether it changed.
fn apply_composite_field(
  map: &mut JsonMap,
  conf: &mut FieldConfidence,
  field: &str,
  incoming: &Value,
  new_conf: f64,
) -> bool {
  // An empty incoming container contributes nothing, not even a key.
  let incoming_empty = match incoming {
    Value::Array(items) => items.is_empty(),
    Value::Object(entries) => entries.is_empty(),
    _ => false,
  };
  if incoming_empty {
    return false;
  }

  let before = map.get(field).cloned();

  let mut scratch = JsonMap::new();
  if let Some(existing) = before.clone() {
    scratch.insert(field.to_string(), existing);
  }
  let mut delta = JsonMap::new();
  delta.insert(field.to_string(), incoming.clone());
  deep_merge(&mut scratch, &delta);

  match scratch.remove(field) {
    Some(after) => {
      let changed = before.as_ref() != Some(&after);
      map.insert(field.to_string(), after);
      conf.raise_to(field, new_conf);
      changed
    }
    None => false,
  }
}

// ─── Deep merge ──────────────────────────────────────────────────────────────

/// Field names whose list values dedupe case-insensitively.
const CATEGORY_LIST_FIELDS: &[&str] = &["categories", "additional_categories"];

/// Key whose list form is `[{key, value}]`, deduped by lowercased key.
const ATTRIBUTES_KEY: &str = "other_attributes";

/// Recursively merge `incoming` into `master`, in place.
///
/// Strictly additive: existing non-null values are never overwritten, list
/// items are appended only when genuinely new, and empty containers are
/// never written — absent and empty stay distinguishable downstream.
/// Scalar fills are first-non-null-wins, so merge order matters when
/// sources disagree on a nested value.
pub fn deep_merge(master: &mut JsonMap, incoming: &JsonMap) {
  for (key, value) in incoming {
    match value {
      Value::Null => {}

      Value::Array(items) if key == ATTRIBUTES_KEY => {
        merge_attribute_list(master, key, items);
      }

      Value::Object(entries) => {
        if entries.is_empty() {
          continue;
        }
        let mut target = match master.get(key) {
          Some(Value::Object(existing)) => existing.clone(),
          _ => JsonMap::new(),
        };
        deep_merge(&mut target, entries);
        if !target.is_empty() {
          master.insert(key.clone(), Value::Object(target));
        }
      }

      Value::Array(items) => {
        if items.is_empty() {
          continue;
        }
        let mut target = match master.get(key) {
          Some(Value::Array(existing)) => existing.clone(),
          _ => Vec::new(),
        };
        if CATEGORY_LIST_FIELDS.contains(&key.as_str()) {
          merge_category_list(&mut target, items);
        } else {
          merge_generic_list(&mut target, items);
        }
        if !target.is_empty() {
          master.insert(key.clone(), Value::Array(target));
        }
      }

      scalar => {
        // Fill-once: only set when the key is absent or null.
        if master.get(key).is_none_or(Value::is_null) {
          master.insert(key.clone(), scalar.clone());
        }
      }
    }
  }
}

/// Case-insensitive string dedupe, preserving the casing seen first.
fn merge_category_list(target: &mut Vec<Value>, items: &[Value]) {
  let mut seen: BTreeSet<String> = target
    .iter()
    .filter_map(Value::as_str)
    .map(str::to_lowercase)
    .collect();

  for item in items {
    let Some(s) = item.as_str() else { continue };
    if seen.insert(s.to_lowercase()) {
      target.push(item.clone());
    }
  }
}

/// Dedupe by string representation, appending in order of first appearance.
fn merge_generic_list(target: &mut Vec<Value>, items: &[Value]) {
  let mut seen: BTreeSet<String> = target.iter().map(value_repr).collect();

  for item in items {
    if item.is_null() {
      continue;
    }
    if seen.insert(value_repr(item)) {
      target.push(item.clone());
    }
  }
}

/// Dedupe key for a list element. Bare strings use their content so that
/// `"padel"` and `"\"padel\""` don't slip past each other.
fn value_repr(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

/// `other_attributes` in `[{key, value}]` form: append only items whose
/// lowercased key is new and whose value is non-null.
fn merge_attribute_list(master: &mut JsonMap, key: &str, items: &[Value]) {
  let mut target = match master.get(key) {
    Some(Value::Array(existing)) => existing.clone(),
    _ => Vec::new(),
  };
  let mut seen: BTreeSet<String> = target
    .iter()
    .filter_map(|attr| attr.get("key").and_then(Value::as_str))
    .map(str::to_lowercase)
    .collect();

  for item in items {
    let Some(attr) = item.as_object() else { continue };
    let Some(attr_key) = attr.get("key").and_then(Value::as_str) else {
      continue;
    };
    if attr_key.is_empty() || attr.get("value").is_none_or(Value::is_null) {
      continue;
    }
    if seen.insert(attr_key.to_lowercase()) {
      target.push(item.clone());
    }
  }

  if !target.is_empty() {
    master.insert(key.to_string(), Value::Array(target));
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn obj(value: Value) -> JsonMap {
    match value {
      Value::Object(map) => map,
      other => panic!("expected object, got {other}"),
    }
  }

  // ── Scalar gate ───────────────────────────────────────────────────────

  #[test]
  fn reaffirmed_value_raises_confidence_without_change() {
    let mut map = obj(json!({"phone": "+441315397071"}));
    let mut conf = FieldConfidence::new();
    conf.set("phone", 0.88);

    let changed =
      apply_scalar_field(&mut map, &mut conf, "phone", &json!("+441315397071"), 0.97);

    assert!(!changed);
    assert_eq!(conf.get("phone"), 0.97);
  }

  #[test]
  fn reaffirmed_value_never_lowers_confidence() {
    let mut map = obj(json!({"phone": "+441315397071"}));
    let mut conf = FieldConfidence::new();
    conf.set("phone", 0.88);

    apply_scalar_field(&mut map, &mut conf, "phone", &json!("+441315397071"), 0.2);

    assert_eq!(conf.get("phone"), 0.88);
  }

  #[test]
  fn differing_value_at_threshold_overwrites() {
    // 0.70 against stored 0.90: not more confident, but the absolute bar
    // is inclusive at 0.7, so the overwrite goes through and the stored
    // confidence *drops* to 0.70.
    let mut map = obj(json!({"website_url": "https://a.com"}));
    let mut conf = FieldConfidence::new();
    conf.set("website_url", 0.90);

    let changed =
      apply_scalar_field(&mut map, &mut conf, "website_url", &json!("https://b.com"), 0.70);

    assert!(changed);
    assert_eq!(map["website_url"], json!("https://b.com"));
    assert_eq!(conf.get("website_url"), 0.70);
  }

  #[test]
  fn differing_value_below_threshold_mutates_nothing() {
    let mut map = obj(json!({"website_url": "https://a.com"}));
    let mut conf = FieldConfidence::new();
    conf.set("website_url", 0.90);

    let before_map = map.clone();
    let before_conf = conf.clone();

    let changed =
      apply_scalar_field(&mut map, &mut conf, "website_url", &json!("https://b.com"), 0.69);

    assert!(!changed);
    assert_eq!(map, before_map);
    assert_eq!(conf, before_conf);
  }

  #[test]
  fn more_confident_value_overwrites_below_threshold() {
    let mut map = obj(json!({"city": "Leith"}));
    let mut conf = FieldConfidence::new();
    conf.set("city", 0.2);

    let changed = apply_scalar_field(&mut map, &mut conf, "city", &json!("Edinburgh"), 0.4);

    assert!(changed);
    assert_eq!(map["city"], json!("Edinburgh"));
    assert_eq!(conf.get("city"), 0.4);
  }

  #[test]
  fn zero_confidence_never_overwrites_a_differing_value() {
    let mut map = obj(json!({"city": "Edinburgh"}));
    let mut conf = FieldConfidence::new();

    let changed = apply_scalar_field(&mut map, &mut conf, "city", &json!("Glasgow"), 0.0);

    assert!(!changed);
    assert_eq!(map["city"], json!("Edinburgh"));
  }

  #[test]
  fn integer_and_float_forms_compare_equal() {
    assert!(values_equal(&json!(55), &json!(55.0)));
    assert!(!values_equal(&json!(55), &json!(55.00001)));
  }

  // ── Deep merge: objects ───────────────────────────────────────────────

  #[test]
  fn nested_scalars_fill_once() {
    let mut master = obj(json!({
      "opening_hours": {"monday": {"open": "09:00"}},
    }));
    let incoming = obj(json!({
      "opening_hours": {"monday": {"open": "08:00", "close": "17:00"}},
    }));

    deep_merge(&mut master, &incoming);

    // Existing open survives; missing close fills in.
    assert_eq!(
      master["opening_hours"],
      json!({"monday": {"open": "09:00", "close": "17:00"}})
    );
  }

  #[test]
  fn empty_containers_are_never_written() {
    let mut master = JsonMap::new();
    let incoming = obj(json!({"opening_hours": {}, "categories": [], "note": null}));

    deep_merge(&mut master, &incoming);

    assert!(master.is_empty());
  }

  #[test]
  fn new_weekdays_are_added() {
    let mut master = obj(json!({"opening_hours": {"monday": "CLOSED"}}));
    let incoming = obj(json!({
      "opening_hours": {"sunday": {"open": "10:00", "close": "16:00"}},
    }));

    deep_merge(&mut master, &incoming);

    let hours = master["opening_hours"].as_object().unwrap();
    assert_eq!(hours.len(), 2);
  }

  // ── Deep merge: lists ─────────────────────────────────────────────────

  #[test]
  fn generic_lists_union_without_duplicates() {
    let mut master = obj(json!({"tags": ["a", "b"]}));
    let incoming = obj(json!({"tags": ["b", "c", "c"]}));

    deep_merge(&mut master, &incoming);

    assert_eq!(master["tags"], json!(["a", "b", "c"]));
  }

  #[test]
  fn category_lists_dedupe_case_insensitively() {
    let mut master = obj(json!({"categories": ["Padel"]}));
    let incoming = obj(json!({"categories": ["PADEL", "padel", "Tennis"]}));

    deep_merge(&mut master, &incoming);

    // First-seen casing wins.
    assert_eq!(master["categories"], json!(["Padel", "Tennis"]));
  }

  #[test]
  fn attribute_lists_dedupe_by_key() {
    let mut master = obj(json!({
      "other_attributes": [{"key": "Year_Established", "value": "1926"}],
    }));
    let incoming = obj(json!({
      "other_attributes": [
        {"key": "year_established", "value": "1930"},
        {"key": "membership_required", "value": "yes"},
        {"key": "broken", "value": null},
      ],
    }));

    deep_merge(&mut master, &incoming);

    let attrs = master["other_attributes"].as_array().unwrap();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs[0]["value"], json!("1926"));
    assert_eq!(attrs[1]["key"], json!("membership_required"));
  }

  // ── apply_updates dispatch ────────────────────────────────────────────

  #[test]
  fn composite_fields_bypass_the_gate() {
    use crate::registry::LISTING_FIELDS;

    let mut map = obj(json!({"categories": ["padel"]}));
    let mut conf = FieldConfidence::new();
    conf.set("categories", 0.9);

    // Confidence 0.0 would never pass the scalar gate, but lists merge
    // additively regardless.
    let updates = obj(json!({"categories": ["tennis"]}));
    let changed = apply_updates(
      &mut map,
      &mut conf,
      LISTING_FIELDS,
      &updates,
      &FieldConfidence::new(),
    );

    assert_eq!(changed, vec!["categories"]);
    assert_eq!(map["categories"], json!(["padel", "tennis"]));
    assert_eq!(conf.get("categories"), 0.9);
  }

  #[test]
  fn unchanged_composite_is_not_reported() {
    use crate::registry::LISTING_FIELDS;

    let mut map = obj(json!({"categories": ["padel"]}));
    let mut conf = FieldConfidence::new();

    let updates = obj(json!({"categories": ["PADEL"]}));
    let changed = apply_updates(
      &mut map,
      &mut conf,
      LISTING_FIELDS,
      &updates,
      &FieldConfidence::new(),
    );

    assert!(changed.is_empty());
  }
}
