use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};


/// Per-field validation messages, keyed by request field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        FieldErrors(BTreeMap::new())
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        }
        else {
            Err(self)
        }
    }
}

/// Trims and drops empty optional strings, so blank form fields are stored as NULL.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_merge_keeps_messages_of_both() {
        let mut a = FieldErrors::new();
        a.add("name", "required");
        let mut b = FieldErrors::new();
        b.add("name", "too long");
        b.add("code", "taken");
        a.merge(b);
        assert_eq!(a.0["name"].len(), 2);
        assert!(a.contains("code"));
    }

    #[test]
    fn test_blank_optional_becomes_none() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" Roma ".into())), Some("Roma".into()));
    }
}
