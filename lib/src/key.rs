//! The specimen identifier used to join the isolates and AST tables.
use crate::ArcStr;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::{borrow::Borrow, fmt, ops::Deref};

/// Trailing `.0` groups left behind when a numeric column was round-tripped through a float.
static FLOAT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\.0)+$").unwrap());

/// A specimen identifier in canonical string form.
///
/// Both tables must build their keys through [`SpecimenKey::normalize`], otherwise `123.0` in
/// one table will never meet `123` in the other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SpecimenKey(ArcStr);

impl SpecimenKey {
    pub fn normalize(raw: &str) -> Self {
        SpecimenKey(normalize_key(raw).into())
    }

    /// Blank keys never take part in a join.
    pub fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strip surrounding whitespace and any float-artifact suffix.
///
/// All trailing `.0` groups are removed, not only the last one, so that normalizing twice is
/// the same as normalizing once.
pub fn normalize_key(raw: &str) -> String {
    let mut key = raw.trim();
    while let Some(suffix) = FLOAT_SUFFIX.find(key) {
        key = key[..suffix.start()].trim_end();
    }
    key.to_owned()
}

impl Deref for SpecimenKey {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SpecimenKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpecimenKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpecimenKey {
    fn from(raw: &str) -> Self {
        Self::normalize(raw)
    }
}

#[cfg(test)]
mod test {
    use super::{normalize_key, SpecimenKey};
    use proptest::prelude::*;

    #[test]
    fn strips_float_suffix() {
        assert_eq!(normalize_key("123.0"), "123");
        assert_eq!(normalize_key("123"), "123");
        assert_eq!(SpecimenKey::normalize("123.0"), SpecimenKey::normalize("123"));
    }

    #[test]
    fn keeps_real_decimals() {
        assert_eq!(normalize_key("123.05"), "123.05");
        assert_eq!(normalize_key("224975030-400"), "224975030-400");
        assert_eq!(normalize_key("10"), "10");
    }

    #[test]
    fn serializes_canonical_form() {
        let key = SpecimenKey::normalize(" 224975030.0 ");
        assert_eq!(serde_json::to_string(&key).unwrap(), r#""224975030""#);
    }

    #[test]
    fn trims() {
        assert_eq!(normalize_key(" 23399301001.0 "), "23399301001");
        assert!(SpecimenKey::normalize("   ").is_blank());
    }

    proptest! {
        #[test]
        fn idempotent(raw in "[0-9A-Za-z. -]{0,16}") {
            let once = normalize_key(&raw);
            prop_assert_eq!(normalize_key(&once), once.clone());
        }

        #[test]
        fn float_artifact_matches_integer(id in 0u64..10_000_000_000) {
            prop_assert_eq!(
                SpecimenKey::normalize(&format!("{}.0", id)),
                SpecimenKey::normalize(&id.to_string())
            );
        }
    }
}
