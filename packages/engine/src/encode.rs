//! Wire encoding of expression graphs.
//!
//! The platform accepts a flat table of value nodes keyed by id plus the
//! id of the result node:
//!
//! ```text
//! { "result": "3",
//!   "values": {
//!     "0": { "functionInvocationValue": { "functionName": "ImageCollection.load",
//!                                         "arguments": { "id": { "constantValue": "..." } } } },
//!     "1": { "functionInvocationValue": { ..., "arguments": { "collection": { "valueReference": "0" } } } },
//!     ... } }
//! ```
//!
//! Constants are inlined. Every other node is interned, so structurally
//! identical sub-graphs (the composite reused by sampling, classification
//! and the area reduction) are sent once.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::expr::Expr;

/// Encodes `expr` into the platform's expression format.
#[must_use]
pub fn encode(expr: &Expr) -> Value {
    let mut encoder = Encoder::default();
    let root = encoder.node(expr);
    let result = encoder.intern(root);
    json!({
        "result": result,
        "values": Value::Object(encoder.values),
    })
}

#[derive(Default)]
struct Encoder {
    values: Map<String, Value>,
    ids: BTreeMap<String, String>,
}

impl Encoder {
    fn node(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Constant(value) => json!({ "constantValue": value }),
            Expr::Array(items) => {
                let values: Vec<Value> = items.iter().map(|item| self.reference(item)).collect();
                json!({ "arrayValue": { "values": values } })
            }
            Expr::Dictionary(entries) => {
                json!({ "dictionaryValue": { "values": self.references(entries) } })
            }
            Expr::Invocation {
                function,
                arguments,
            } => json!({
                "functionInvocationValue": {
                    "functionName": function,
                    "arguments": self.references(arguments),
                }
            }),
        }
    }

    fn references(&mut self, entries: &BTreeMap<String, Expr>) -> Map<String, Value> {
        entries
            .iter()
            .map(|(key, value)| (key.clone(), self.reference(value)))
            .collect()
    }

    fn reference(&mut self, expr: &Expr) -> Value {
        if let Expr::Constant(value) = expr {
            return json!({ "constantValue": value });
        }
        let node = self.node(expr);
        let id = self.intern(node);
        json!({ "valueReference": id })
    }

    fn intern(&mut self, node: Value) -> String {
        let key = node.to_string();
        if let Some(id) = self.ids.get(&key) {
            return id.clone();
        }
        let id = self.values.len().to_string();
        self.values.insert(id.clone(), node);
        self.ids.insert(key, id.clone());
        id
    }
}
