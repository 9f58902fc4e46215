//! German federal-state codes (Länderschlüssel) to state names.

use trestle_core::record::AttrValue;

const STATES: [&str; 16] = [
  "Schleswig-Holstein",
  "Hamburg",
  "Niedersachsen",
  "Bremen",
  "Nordrhein-Westfalen",
  "Hessen",
  "Rheinland-Pfalz",
  "Baden-Württemberg",
  "Bayern",
  "Saarland",
  "Berlin",
  "Brandenburg",
  "Mecklenburg-Vorpommern",
  "Sachsen",
  "Sachsen-Anhalt",
  "Thüringen",
];

/// The state name for code `1..=16`.
pub fn state_name(code: i64) -> Option<&'static str> {
  usize::try_from(code)
    .ok()
    .and_then(|c| c.checked_sub(1))
    .and_then(|i| STATES.get(i))
    .copied()
}

/// Resolve a subdivision attribute. Accepts a numeric code, a code written as
/// text (`"09"`, `"9"`, `"9.0"`), or an already-canonical state name. Anything
/// else is absent.
pub fn lookup(value: &AttrValue) -> Option<&'static str> {
  match value {
    AttrValue::Int(code) => state_name(*code),
    AttrValue::Float(f) if f.fract() == 0.0 => state_name(*f as i64),
    AttrValue::Text(s) => {
      let s = s.trim();
      if let Ok(code) = s.parse::<i64>() {
        return state_name(code);
      }
      if let Ok(f) = s.parse::<f64>()
        && f.fract() == 0.0
      {
        return state_name(f as i64);
      }
      STATES.iter().copied().find(|name| name.eq_ignore_ascii_case(s))
    }
    _ => None,
  }
}
