//! The lazy expression graph.
//!
//! An [`Expr`] describes a computation without performing it. Nodes are
//! constants, arrays, dictionaries or invocations of a named platform
//! algorithm with named arguments. Graphs are only evaluated when handed
//! to an [`Engine`](crate::Engine).

use std::collections::BTreeMap;

/// A node in a lazy computation graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal JSON value.
    Constant(serde_json::Value),
    /// An ordered list of sub-expressions.
    Array(Vec<Self>),
    /// A string-keyed map of sub-expressions.
    Dictionary(BTreeMap<String, Self>),
    /// A call to a platform algorithm.
    Invocation {
        /// Fully qualified algorithm name, e.g. `"Image.select"`.
        function: String,
        /// Named arguments.
        arguments: BTreeMap<String, Self>,
    },
}

impl Expr {
    /// A literal value.
    #[must_use]
    pub fn constant(value: impl Into<serde_json::Value>) -> Self {
        Self::Constant(value.into())
    }

    /// An invocation of `function` with the given named arguments.
    #[must_use]
    pub fn call<'a>(function: &str, arguments: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Invocation {
            function: function.to_string(),
            arguments: arguments
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// An array of sub-expressions.
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(items.into_iter().collect())
    }

    /// A dictionary of sub-expressions.
    #[must_use]
    pub fn dictionary<'a>(entries: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    /// A constant list of strings.
    #[must_use]
    pub fn strings<S: AsRef<str>>(items: impl IntoIterator<Item = S>) -> Self {
        Self::Constant(serde_json::Value::Array(
            items
                .into_iter()
                .map(|s| serde_json::Value::String(s.as_ref().to_string()))
                .collect(),
        ))
    }

    /// The algorithm name if this node is an invocation.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::Invocation { function, .. } => Some(function),
            _ => None,
        }
    }

    /// A named argument if this node is an invocation.
    #[must_use]
    pub fn argument(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Invocation { arguments, .. } => arguments.get(name),
            _ => None,
        }
    }

    /// The literal value if this node is a constant.
    #[must_use]
    pub const fn as_constant(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Visits every node depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Constant(_) => {}
            Self::Array(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            Self::Dictionary(entries) | Self::Invocation { arguments: entries, .. } => {
                for value in entries.values() {
                    value.walk(visit);
                }
            }
        }
    }

    /// All invocations of `function` anywhere in the graph, in walk order.
    #[must_use]
    pub fn invocations_of(&self, function: &str) -> Vec<&Self> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if node.function_name() == Some(function) {
                found.push(node);
            }
        });
        found
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::constant(value)
    }
}

impl From<u64> for Expr {
    fn from(value: u64) -> Self {
        Self::constant(value)
    }
}

impl From<u32> for Expr {
    fn from(value: u32) -> Self {
        Self::constant(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Self::constant(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Self::constant(value)
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Self::constant(value)
    }
}

/// A typed handle around an [`Expr`].
pub trait ComputedObject {
    /// The underlying graph node.
    fn expr(&self) -> &Expr;

    /// Consumes the handle and returns the graph node.
    fn into_expr(self) -> Expr;
}

/// Implements [`ComputedObject`] and `From<Self> for Expr` for a newtype.
macro_rules! computed_object {
    ($name:ident) => {
        impl $crate::expr::ComputedObject for $name {
            fn expr(&self) -> &$crate::expr::Expr {
                &self.0
            }

            fn into_expr(self) -> $crate::expr::Expr {
                self.0
            }
        }

        impl From<$name> for $crate::expr::Expr {
            fn from(object: $name) -> Self {
                object.0
            }
        }

        impl $name {
            /// Wraps an arbitrary expression. The caller vouches for its type.
            #[must_use]
            pub const fn from_expr(expr: $crate::expr::Expr) -> Self {
                Self(expr)
            }
        }
    };
}

pub(crate) use computed_object;
