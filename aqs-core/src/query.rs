use std::collections::BTreeMap;

use crate::error::AqsError;

/// A set of named request parameters for one AQS call.
///
/// Callers build a base template once and every call overlays its own values
/// into a fresh copy via [`QueryTemplate::merged`]; the base is never mutated,
/// so nothing leaks from one call into the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTemplate {
    params: BTreeMap<String, String>,
}

impl QueryTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one parameter, consuming and returning the template so calls chain.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns a fresh template with `overrides` layered on top of `self`.
    /// Fields the override does not mention keep their base value.
    pub fn merged(&self, overrides: &QueryTemplate) -> QueryTemplate {
        let mut params = self.params.clone();
        for (name, value) in &overrides.params {
            params.insert(name.clone(), value.clone());
        }
        QueryTemplate { params }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Looks up `name` and rejects absent or empty values.
    pub(crate) fn require(&self, name: &str) -> Result<&str, AqsError> {
        match self.get(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(AqsError::MissingField(name.to_string())),
        }
    }
}

/// Splits a 5-digit county FIPS code into its state and county parts:
/// `"46103"` becomes `("46", "103")`.
pub fn split_county_fips(fips: &str) -> Result<(&str, &str), AqsError> {
    if fips.len() != 5 || !fips.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AqsError::InvalidFips(fips.to_string()));
    }
    Ok((&fips[..2], &fips[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merged_overrides_take_precedence() {
        let base = QueryTemplate::new().set("state", "46").set("param", "81102");
        let overrides = QueryTemplate::new().set("param", "88101");

        let merged = base.merged(&overrides);

        assert_eq!(merged.get("state"), Some("46"));
        assert_eq!(merged.get("param"), Some("88101"));
    }

    #[test]
    fn merged_leaves_base_untouched() {
        let base = QueryTemplate::new().set("param", "81102");
        let overrides = QueryTemplate::new().set("param", "88101").set("county", "103");

        let _ = base.merged(&overrides);

        assert_eq!(base.get("param"), Some("81102"));
        assert_eq!(base.get("county"), None);
    }

    #[test]
    fn require_rejects_empty_values() {
        let template = QueryTemplate::new().set("email", "");

        let err = template.require("email").unwrap_err();
        assert!(err.to_string().contains("email"));

        let err = template.require("key").unwrap_err();
        assert!(err.to_string().contains("key"));
    }

    #[test]
    fn split_fips_is_two_plus_three() {
        let (state, county) = split_county_fips("46103").expect("valid code");
        assert_eq!(state, "46");
        assert_eq!(county, "103");
    }

    #[test]
    fn split_fips_rejects_malformed_codes() {
        for bad in ["4610", "461034", "4610a", ""] {
            assert!(split_county_fips(bad).is_err(), "accepted {bad:?}");
        }
    }
}
