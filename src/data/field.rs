//! Field specifier parsing.
//!
//! A field is a user expression optionally decorated with suffixes:
//! `ATT.Roll:2` plots on the secondary axis, `ATT.Roll:1` only uses the first
//! log, and a trailing `<label>` sets the legend text, e.g.
//! `GPS[0].Alt:2<Altitude>`.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SIMPLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9_]*)[.]([A-Za-z_][A-Za-z0-9_]*)$").expect("valid regex")
});
static RE_CAPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z_][A-Z0-9_]+").expect("valid regex"));
static RE_INSTANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z_][A-Z0-9_]+)\[([0-9A-Z_]+)\]").expect("valid regex"));

/// Which y axis a field is drawn against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    #[default]
    Primary,
    Secondary,
}

impl Axis {
    /// 1 for the left axis, 2 for the right.
    pub fn number(&self) -> u8 {
        match self {
            Axis::Primary => 1,
            Axis::Secondary => 2,
        }
    }
}

/// One parsed field specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The string as given by the user.
    pub raw: String,
    /// Expression with label and suffixes removed.
    pub expression: String,
    pub axis: Axis,
    /// Only take data from the first log source.
    pub first_only: bool,
    pub label: Option<String>,
    /// `(TYPE, attribute)` when the expression is exactly `TYPE.attribute`.
    pub simple: Option<(String, String)>,
    /// Uppercase message-type tokens referenced by the expression.
    pub msg_types: BTreeSet<String>,
    /// Instance-bearing type to the instance values it selects, from `TYPE[value]`.
    pub instances: BTreeMap<String, BTreeSet<String>>,
}

impl FieldSpec {
    pub fn parse(raw: &str) -> Self {
        let mut expr = raw.to_string();
        let mut label = None;
        if expr.ends_with('>') {
            if let Some(open) = expr.rfind('<') {
                label = Some(expr[open + 1..expr.len() - 1].to_string());
                expr.truncate(open);
            }
        }

        let mut axis = Axis::Primary;
        if let Some(stripped) = expr.strip_suffix(":2") {
            axis = Axis::Secondary;
            expr = stripped.to_string();
        }
        let mut first_only = false;
        if let Some(stripped) = expr.strip_suffix(":1") {
            first_only = true;
            expr = stripped.to_string();
        }

        let simple = RE_SIMPLE
            .captures(&expr)
            .map(|c| (c[1].to_string(), c[2].to_string()));

        let msg_types = RE_CAPS
            .find_iter(&expr)
            .map(|m| m.as_str().to_string())
            .collect();

        let mut instances: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for c in RE_INSTANCE.captures_iter(&expr) {
            instances
                .entry(c[1].to_string())
                .or_default()
                .insert(c[2].to_string());
        }

        Self {
            raw: raw.to_string(),
            expression: expr,
            axis,
            first_only,
            label,
            simple,
            msg_types,
            instances,
        }
    }

    /// Legend text: the custom label when given, otherwise the bare expression.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.expression)
    }

    pub fn is_secondary(&self) -> bool {
        self.axis == Axis::Secondary
    }

    pub fn uses_type(&self, msg_type: &str) -> bool {
        self.msg_types.contains(msg_type)
    }

    /// Accepted instance values for `msg_type`, if this field selects instances of it.
    pub fn instance_values(&self, msg_type: &str) -> Option<&BTreeSet<String>> {
        self.instances.get(msg_type)
    }
}

pub fn parse_fields<S: AsRef<str>>(raw: &[S]) -> Vec<FieldSpec> {
    raw.iter().map(|f| FieldSpec::parse(f.as_ref())).collect()
}

/// Union of all message types the fields need.
pub fn message_types(fields: &[FieldSpec]) -> HashSet<String> {
    fields
        .iter()
        .flat_map(|f| f.msg_types.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_order_label_then_axis_then_first() {
        let f = FieldSpec::parse("ATT.Roll:1:2<Roll angle>");
        assert_eq!(f.expression, "ATT.Roll");
        assert_eq!(f.axis, Axis::Secondary);
        assert!(f.first_only);
        assert_eq!(f.label.as_deref(), Some("Roll angle"));
    }

    #[test]
    fn label_uses_innermost_open_bracket() {
        let f = FieldSpec::parse("ATT.Roll<a<b>");
        assert_eq!(f.expression, "ATT.Roll<a");
        assert_eq!(f.label.as_deref(), Some("b"));
    }

    #[test]
    fn compound_is_not_simple() {
        let f = FieldSpec::parse("ATT.Roll + GPS[1].Alt");
        assert!(f.simple.is_none());
        assert!(f.uses_type("ATT") && f.uses_type("GPS"));
        assert_eq!(
            f.instance_values("GPS").map(|s| s.iter().cloned().collect::<Vec<_>>()),
            Some(vec!["1".to_string()])
        );
    }
}
