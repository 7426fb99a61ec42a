use std::path::Path;

use serde::Deserialize;

use docfix::Delimiters;

use crate::error::RewriteError;

/// File rewritten when no path is given.
pub const DEFAULT_TARGET: &str = "api/docs/openapi-annotations.js";

const ORDER_STATUS_SCHEMA: [&str; 5] = [
    " *       required: true",
    " *       content:",
    " *         application/json:",
    " *           schema:",
    " *             $ref: '#/components/schemas/OrderStatusUpdate'",
];

/// Everything one dedupe-and-rewrite run needs to know.
///
/// Deserialized from TOML; omitted fields take the order-status values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Recipe {
    /// Phrase identifying the start of the target block.
    pub marker: String,

    /// Trimmed line content that ends a block.
    pub closing: String,

    /// Line (substring) after which the replaced span begins.
    pub section_start: String,

    /// Line (substring) before which the replaced span ends.
    pub section_end: String,

    /// Lines inserted between `section_start` and `section_end`.
    pub replacement: Vec<String>,
}

impl Default for Recipe {
    fn default() -> Self {
        Recipe::order_status()
    }
}

impl Recipe {
    /// Dedupe the "Update order status" endpoint and point its request body
    /// at the shared `OrderStatusUpdate` schema.
    pub fn order_status() -> Self {
        Recipe {
            marker: "Update order status".to_string(),
            closing: "*/".to_string(),
            section_start: "requestBody:".to_string(),
            section_end: "responses:".to_string(),
            replacement: ORDER_STATUS_SCHEMA.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn from_toml(source: &str) -> Result<Self, RewriteError> {
        let recipe: Recipe = toml::from_str(source)?;
        recipe.validate()?;
        Ok(recipe)
    }

    pub fn load(path: &Path) -> Result<Self, RewriteError> {
        let source = std::fs::read_to_string(path).map_err(|source| RewriteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Recipe::from_toml(&source)
    }

    pub fn delimiters(&self) -> Delimiters {
        Delimiters::new(self.marker.as_str(), self.closing.as_str())
    }

    pub fn validate(&self) -> Result<(), RewriteError> {
        let required = [
            ("marker", &self.marker),
            ("closing", &self.closing),
            ("section_start", &self.section_start),
            ("section_end", &self.section_end),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(RewriteError::InvalidRecipe(format!("`{}` must not be empty", name)));
            }
        }
        // Replacement lines must not look like any delimiter, or the next run
        // finds a different block or span.
        for line in &self.replacement {
            let clash = if line.contains(&self.marker) {
                Some("the marker")
            } else if line.trim() == self.closing {
                Some("the closing token")
            } else if line.contains(&self.section_start) || line.contains(&self.section_end) {
                Some("a section delimiter")
            } else {
                None
            };
            if let Some(what) = clash {
                return Err(RewriteError::InvalidRecipe(format!(
                    "replacement line {:?} matches {}",
                    line, what
                )));
            }
        }
        Ok(())
    }
}
