use crate::graph::{DialogueGraph, DisplayFormat, DisplayItem, Value};
use itertools::Itertools;
use std::collections::BTreeMap;

const YEN: char = '￥';

/// Renders confirmation display items and composes screen prompts.
pub struct PromptFormatter;

impl PromptFormatter {
    /// Renders one display item as `label: value`.
    pub fn format_item(
        graph: &DialogueGraph,
        item: &DisplayItem,
        variables: &BTreeMap<String, Value>,
    ) -> String {
        let value = match variables.get(&item.field) {
            Some(value) => Self::format_value(graph, &item.format, value),
            None => String::new(),
        };
        format!("{}: {}", item.label, value)
    }

    pub fn format_items(
        graph: &DialogueGraph,
        items: &[DisplayItem],
        variables: &BTreeMap<String, Value>,
    ) -> Vec<String> {
        items
            .iter()
            .map(|item| Self::format_item(graph, item, variables))
            .collect()
    }

    /// Joins a navigation text and rendered display lines into one prompt.
    pub fn compose(nav_text: &str, lines: &[String]) -> String {
        if lines.is_empty() {
            return nav_text.to_string();
        }
        format!("{}\n\n{}", nav_text, lines.join("\n"))
    }

    fn format_value(graph: &DialogueGraph, format: &DisplayFormat, value: &Value) -> String {
        match format {
            DisplayFormat::Currency => Self::format_currency(value),
            DisplayFormat::Code(code_id) => {
                let raw = value.as_text();
                graph
                    .code_label(code_id, &raw)
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.into_owned())
            }
            DisplayFormat::Text => value.to_string(),
        }
    }

    /// Yen formatting: `5000` renders as `￥5,000`. Values that are not
    /// numbers are shown unchanged.
    pub fn format_currency(value: &Value) -> String {
        let Some(amount) = value.as_number() else {
            return value.to_string();
        };
        let rounded = amount.round();
        let digits = format!("{:.0}", rounded.abs());
        let grouped: String = digits
            .chars()
            .rev()
            .chunks(3)
            .into_iter()
            .map(|chunk| chunk.collect::<String>())
            .join(",")
            .chars()
            .rev()
            .collect();
        if rounded < 0.0 {
            format!("-{}{}", YEN, grouped)
        } else {
            format!("{}{}", YEN, grouped)
        }
    }
}
