//! Statement parameters: `name: value` pairs and their legality rules.

use std::collections::HashMap;

use super::error::CompileError;

/// A parameter value as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    /// A string literal or a bare identifier.
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Str(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
        }
    }
}

/// Parameters attached to a statement. Keys are unique.
pub type Parameters = HashMap<String, ParamValue>;

/// Numeric value of a parameter, if present.
pub fn number(params: &Parameters, name: &str) -> Option<f64> {
    params.get(name).and_then(ParamValue::as_f64)
}

/// Which legality table a parameter list is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamContext {
    /// background, mode, scene, show, hide
    Visual,
    /// dialogue lines
    Dialogue,
}

impl ParamContext {
    fn describe(self) -> &'static str {
        match self {
            ParamContext::Visual => "visual",
            ParamContext::Dialogue => "dialogue",
        }
    }
}

/// Legal parameter names per context. Every legal parameter is numeric.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRules {
    pub visual: Vec<String>,
    pub dialogue: Vec<String>,
}

impl Default for ParamRules {
    fn default() -> Self {
        Self {
            visual: Self::default_visual(),
            dialogue: Self::default_dialogue(),
        }
    }
}

impl ParamRules {
    pub fn default_visual() -> Vec<String> {
        ["x", "y", "scale"].map(String::from).to_vec()
    }

    pub fn default_dialogue() -> Vec<String> {
        ["size", "speed"].map(String::from).to_vec()
    }

    pub fn legal(&self, context: ParamContext) -> &[String] {
        match context {
            ParamContext::Visual => &self.visual,
            ParamContext::Dialogue => &self.dialogue,
        }
    }

    /// Check one parameter against the table for `context`.
    pub fn check(
        &self,
        context: ParamContext,
        name: &str,
        value: &ParamValue,
        line: usize,
        col: usize,
    ) -> Result<(), CompileError> {
        let legal = self.legal(context);
        if !legal.iter().any(|n| n == name) {
            return Err(CompileError::semantic(
                format!(
                    "parameter '{name}' is not allowed in a {} context (expected one of: {})",
                    context.describe(),
                    legal.join(", ")
                ),
                line,
                col,
            ));
        }
        if value.as_f64().is_none() {
            return Err(CompileError::semantic(
                format!(
                    "parameter '{name}' must be numeric, got {}",
                    value.type_name()
                ),
                line,
                col,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;

    #[test]
    fn default_tables() {
        let rules = ParamRules::default();
        assert_eq!(rules.legal(ParamContext::Visual), ["x", "y", "scale"]);
        assert_eq!(rules.legal(ParamContext::Dialogue), ["size", "speed"]);
    }

    #[test]
    fn numeric_values_pass() {
        let rules = ParamRules::default();
        assert!(rules
            .check(ParamContext::Visual, "x", &ParamValue::Int(10), 1, 1)
            .is_ok());
        assert!(rules
            .check(ParamContext::Dialogue, "speed", &ParamValue::Float(20.5), 1, 1)
            .is_ok());
    }

    #[test]
    fn illegal_name_is_rejected() {
        let rules = ParamRules::default();
        let err = rules
            .check(ParamContext::Visual, "color", &ParamValue::Int(1), 2, 5)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Semantic);
        assert!(err.message.contains("'color'"));
        assert_eq!((err.line, err.col), (2, 5));
    }

    #[test]
    fn names_are_context_sensitive() {
        let rules = ParamRules::default();
        assert!(rules
            .check(ParamContext::Dialogue, "x", &ParamValue::Int(1), 1, 1)
            .is_err());
        assert!(rules
            .check(ParamContext::Visual, "speed", &ParamValue::Int(1), 1, 1)
            .is_err());
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let rules = ParamRules::default();
        let err = rules
            .check(
                ParamContext::Visual,
                "y",
                &ParamValue::Str("oops".to_string()),
                1,
                1,
            )
            .unwrap_err();
        assert!(err.message.contains("'y'"));
        assert!(err.message.contains("numeric"));
    }

    #[test]
    fn custom_tables() {
        let rules = ParamRules {
            visual: vec!["x".to_string()],
            dialogue: vec!["size".to_string(), "font".to_string(), "speed".to_string()],
        };
        assert!(rules
            .check(ParamContext::Dialogue, "font", &ParamValue::Int(2), 1, 1)
            .is_ok());
        assert!(rules
            .check(ParamContext::Visual, "scale", &ParamValue::Int(2), 1, 1)
            .is_err());
    }

    #[test]
    fn number_lookup() {
        let mut params = Parameters::new();
        params.insert("x".to_string(), ParamValue::Int(3));
        params.insert("label".to_string(), ParamValue::Str("a".to_string()));
        assert_eq!(number(&params, "x"), Some(3.0));
        assert_eq!(number(&params, "label"), None);
        assert_eq!(number(&params, "y"), None);
    }
}
