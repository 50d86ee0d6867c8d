//! Prompt templates with `{placeholder}` substitution.

use crate::context::ContextView;
use crate::errors::StageError;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_][a-z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// A prompt with named placeholders.
///
/// Placeholders are filled from build-time partials first, then from the
/// stage's context view. Partial values are inserted verbatim and are not
/// scanned for further placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    partials: BTreeMap<String, String>,
}

impl PromptTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            partials: BTreeMap::new(),
        }
    }

    /// Binds a placeholder to a fixed value.
    #[must_use]
    pub fn partial(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.partials.insert(name.into(), value.into());
        self
    }

    /// Returns every placeholder name, in order of first appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let name = &caps[1];
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Returns the placeholders that must come from the context.
    #[must_use]
    pub fn context_keys(&self) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter(|name| !self.partials.contains_key(name))
            .collect()
    }

    /// Renders the template against a context view.
    ///
    /// # Errors
    ///
    /// Returns a `StageError` if a placeholder is neither a partial nor a
    /// declared input of the view.
    pub fn render(&self, view: &ContextView<'_>) -> Result<String, StageError> {
        let mut out = String::with_capacity(self.template.len());
        let mut last = 0;

        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let name = &caps[1];
            out.push_str(&self.template[last..whole.start]);
            match self.partials.get(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(&view.get(name)?.render()),
            }
            last = whole.end;
        }
        out.push_str(&self.template[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_placeholders_in_order() {
        let template = PromptTemplate::new("{goal} then {scenario}, again {goal}");
        assert_eq!(template.placeholders(), vec!["goal", "scenario"]);
    }

    #[test]
    fn test_partials_are_not_context_keys() {
        let template = PromptTemplate::new("Parse {evaluation_output}\n\n{format_instructions}")
            .partial("format_instructions", "Return JSON.");
        assert_eq!(template.context_keys(), vec!["evaluation_output"]);
    }

    #[test]
    fn test_render() {
        let goal = ContextValue::text("Sell within 60 days");
        let view = ContextView::new("analyst", vec![("goal", &goal)]);
        let template = PromptTemplate::new("Goal: {goal}. Today is {current_date}.")
            .partial("current_date", "July 24, 2025");

        assert_eq!(
            template.render(&view).unwrap(),
            "Goal: Sell within 60 days. Today is July 24, 2025."
        );
    }

    #[test]
    fn test_render_undeclared_placeholder() {
        let view = ContextView::new("analyst", vec![]);
        let err = PromptTemplate::new("{goal}").render(&view).unwrap_err();
        assert!(matches!(err, StageError::UndeclaredKey(_)));
    }

    #[test]
    fn test_json_braces_are_left_alone() {
        let template = PromptTemplate::new(r#"Example: {"name": "x"} for {scenario}"#);
        assert_eq!(template.placeholders(), vec!["scenario"]);
    }
}
