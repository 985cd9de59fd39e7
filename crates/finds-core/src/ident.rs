//! Listing identifier and slug generation.

use uuid::Uuid;

/// Generate a prefixed, time-ordered listing identifier.
///
/// The prefix is a three-letter code derived from the entity type; the
/// suffix is the first 16 hex characters of a UUIDv7, so ids sort roughly
/// by creation time and never collide across concurrent calls. Called once
/// per entity, at creation — the id is immutable afterwards.
pub fn generate_listing_id(entity_type: &str) -> String {
  let prefix = match entity_type {
    "venue" => "VEN",
    _ => "LST",
  };
  let token = Uuid::now_v7().simple().to_string();
  format!("{prefix}-{}", &token[..16])
}

/// Derive a URL-safe slug from an entity name.
///
/// Pure function of the name: lowercases, strips everything outside
/// `[a-z0-9_\s-]`, collapses runs of whitespace and hyphens into single
/// hyphens, and trims them from the ends. A name that strips down to
/// nothing falls back to a short random token — an empty slug is invalid
/// for routing.
pub fn generate_slug(name: &str) -> String {
  let lowered = name.to_lowercase();
  let mut slug = String::with_capacity(lowered.len());
  let mut pending_hyphen = false;

  for ch in lowered.chars() {
    if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
      if pending_hyphen && !slug.is_empty() {
        slug.push('-');
      }
      pending_hyphen = false;
      slug.push(ch);
    } else if ch.is_whitespace() || ch == '-' {
      pending_hyphen = true;
    }
    // Anything else is stripped outright.
  }

  if slug.is_empty() {
    let token = Uuid::new_v4().simple().to_string();
    return token[..8].to_string();
  }
  slug
}
