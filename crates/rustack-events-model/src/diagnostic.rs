//! Structured diagnostics reported by the compiler.
//!
//! Diagnostics are values, not errors: every stage appends to a
//! [`Diagnostics`] list and the compiler rejects the specification if the list
//! is non-empty once all stages have run.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable category tag for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// Malformed nesting, duplicate names, forbidden characters, malformed
    /// embedded strings.
    Structural,
    /// Mutually exclusive fields, out-of-range numbers.
    Semantic,
    /// An optional field with no satisfiable fallback source.
    Resolution,
    /// A symbolic reference to an entity that does not exist.
    Referential,
}

impl DiagnosticCategory {
    /// Wire tag of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structural => "structural",
            Self::Semantic => "semantic",
            Self::Resolution => "resolution",
            Self::Referential => "referential",
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in the specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category tag.
    pub category: DiagnosticCategory,
    /// Path of the offending field, e.g. `buses[0].rules[1].name` or
    /// `dead_letter_alarms.orders.queue_name`.
    pub path: String,
    /// Human-readable explanation.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic.
    #[must_use]
    pub fn new(
        category: DiagnosticCategory,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.path, self.message)
    }
}

/// Append-only list of diagnostics.
///
/// Lists built independently (one per bus, one per alarm kind) are joined with
/// [`Diagnostics::extend`]; nothing is ever removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Append a [`DiagnosticCategory::Structural`] diagnostic.
    pub fn structural(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticCategory::Structural, path, message));
    }

    /// Append a [`DiagnosticCategory::Semantic`] diagnostic.
    pub fn semantic(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticCategory::Semantic, path, message));
    }

    /// Append a [`DiagnosticCategory::Resolution`] diagnostic.
    pub fn resolution(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticCategory::Resolution, path, message));
    }

    /// Append a [`DiagnosticCategory::Referential`] diagnostic.
    pub fn referential(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::new(DiagnosticCategory::Referential, path, message));
    }

    /// Append every diagnostic of another list, preserving its order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether no diagnostic was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the diagnostics in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Number of diagnostics in `category`.
    #[must_use]
    pub fn count(&self, category: DiagnosticCategory) -> usize {
        self.0.iter().filter(|d| d.category == category).count()
    }

    /// Consume the list.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
