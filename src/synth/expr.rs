//! # Template Expressions
//!
//! String-valued CloudFormation expressions: literals and the intrinsic
//! functions the secret template resources need.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// A string-valued CloudFormation expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Plain string
    Literal(String),
    /// `{"Ref": logical_id}`
    Ref(String),
    /// `{"Fn::GetAtt": [logical_id, attribute]}`
    GetAtt {
        logical_id: String,
        attribute: String,
    },
    /// `{"Fn::Sub": template}`
    Sub(String),
    /// `{"Fn::Join": [delimiter, parts]}`
    Join { delimiter: String, parts: Vec<Expr> },
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn reference(logical_id: impl Into<String>) -> Self {
        Expr::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Expr::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    pub fn sub(template: impl Into<String>) -> Self {
        Expr::Sub(template.into())
    }

    pub fn join(delimiter: impl Into<String>, parts: Vec<Expr>) -> Self {
        Expr::Join {
            delimiter: delimiter.into(),
            parts,
        }
    }

    /// Render as template JSON
    pub fn to_json(&self) -> Value {
        match self {
            Expr::Literal(value) => Value::String(value.clone()),
            Expr::Ref(logical_id) => json!({ "Ref": logical_id }),
            Expr::GetAtt {
                logical_id,
                attribute,
            } => json!({ "Fn::GetAtt": [logical_id, attribute] }),
            Expr::Sub(template) => json!({ "Fn::Sub": template }),
            Expr::Join { delimiter, parts } => {
                let parts: Vec<Value> = parts.iter().map(Expr::to_json).collect();
                json!({ "Fn::Join": [delimiter, parts] })
            }
        }
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::literal(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
