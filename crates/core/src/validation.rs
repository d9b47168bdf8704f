//! User-config value validation
//!
//! A registration may declare its validation either as a `|`-separated list
//! of primitive type names or as a custom predicate. Unrecognized type names
//! are a fatal configuration error, not a failed validation.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};

/// Custom validator: returns false (or an error) to reject the value
pub type ValidatorFn = Arc<dyn Fn(&Value) -> Result<bool>>;

#[derive(Clone)]
pub enum Validation {
    /// Disjunction of primitive type names, e.g. `"string|array"`
    Types(String),
    Custom(ValidatorFn),
}

impl Validation {
    pub fn custom(f: impl Fn(&Value) -> Result<bool> + 'static) -> Self {
        Validation::Custom(Arc::new(f))
    }

    /// Check a config value against this rule. `name` is the config key,
    /// used in error messages.
    pub fn check(&self, name: &str, value: &Value) -> Result<()> {
        match self {
            Validation::Types(types) => {
                let mut matched = false;
                for type_name in types.split('|') {
                    if type_matches(type_name, value)? {
                        matched = true;
                        break;
                    }
                }
                if !matched {
                    return Err(Error::Validation(format!(
                        "config {name} should be {types}, but got {value}"
                    )));
                }
                Ok(())
            }
            Validation::Custom(validate) => {
                if !validate(value)? {
                    return Err(Error::Validation(format!(
                        "{name} did not pass validation"
                    )));
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Types(types) => f.debug_tuple("Types").field(types).finish(),
            Validation::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

fn type_matches(type_name: &str, value: &Value) -> Result<bool> {
    let matched = match type_name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "boolean" => value.is_boolean(),
        other => {
            return Err(Error::Validation(format!(
                "validation does not support {other}"
            )));
        }
    };
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_type() {
        let validation = Validation::Types("string".into());
        assert!(validation.check("entry", &json!("./src/index.js")).is_ok());
        assert!(validation.check("entry", &json!(42)).is_err());
    }

    #[test]
    fn test_type_disjunction() {
        let validation = Validation::Types("string|array".into());
        assert!(validation.check("entry", &json!("a")).is_ok());
        assert!(validation.check("entry", &json!(["a", "b"])).is_ok());
        assert!(validation.check("entry", &json!({"a": 1})).is_err());
    }

    #[test]
    fn test_unknown_type_name_is_fatal() {
        let validation = Validation::Types("text".into());
        let err = validation.check("entry", &json!("a")).unwrap_err();
        assert!(err.to_string().contains("does not support text"));
    }

    #[test]
    fn test_custom_validator() {
        let validation = Validation::custom(|value| Ok(value.as_u64().is_some_and(|n| n > 0)));
        assert!(validation.check("port", &json!(3000)).is_ok());
        assert!(validation.check("port", &json!(0)).is_err());
    }
}
