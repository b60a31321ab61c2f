//! Journal Compiler - World lore and scenario text to VTT journal documents

use crate::application::dto::{JournalDocument, JournalPage};
use crate::application::services::vtt::{escape_html, ShapeNormalizer, ValidationError};
use crate::domain::value_objects::{FieldValue, NormalizedLore};

pub struct JournalCompiler;

impl JournalCompiler {
    /// One page per lore section, in fixed order. Empty sections are omitted.
    pub fn compile(name: &str, lore: &NormalizedLore) -> JournalDocument {
        let sections = [
            ("World", lore.world_description.as_deref().map(paragraphs)),
            ("History", lore.history.as_deref().map(paragraphs)),
            ("Factions", lore.factions.as_deref().map(list)),
            ("Locations", lore.locations.as_deref().map(list)),
            ("Adventure Hooks", lore.hooks.as_deref().map(list)),
        ];

        JournalDocument {
            name: name.to_string(),
            pages: sections
                .into_iter()
                .filter_map(|(title, content)| {
                    content
                        .filter(|html| !html.is_empty())
                        .map(|html| JournalPage::html(title, html))
                })
                .collect(),
        }
    }

    /// Normalize raw AI lore, then compile it
    pub fn compile_lore(
        name: &str,
        raw: &serde_json::Value,
    ) -> Result<JournalDocument, ValidationError> {
        let lore = ShapeNormalizer::normalize_lore(raw)?;
        Ok(Self::compile(name, &lore))
    }

    /// Single-page journal for a session's scenario text
    pub fn compile_scenario(name: &str, text: &str) -> JournalDocument {
        JournalDocument {
            name: name.to_string(),
            pages: vec![JournalPage::html("Scenario", paragraphs(text))],
        }
    }
}

fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
        .collect()
}

fn list(items: &[FieldValue]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let entries: String = items
        .iter()
        .map(|item| match item {
            FieldValue::Text { value } => format!("<li>{}</li>", escape_html(value)),
            FieldValue::Structured {
                name,
                description: Some(description),
            } => format!(
                "<li><strong>{}</strong>: {}</li>",
                escape_html(name),
                escape_html(description)
            ),
            FieldValue::Structured { name, .. } => {
                format!("<li><strong>{}</strong></li>", escape_html(name))
            }
        })
        .collect();
    format!("<ul>{}</ul>", entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pages_follow_fixed_order() {
        let lore = NormalizedLore {
            world_description: Some("An island.\n\nMostly rock.".to_string()),
            history: Some("Founded long ago.".to_string()),
            factions: Some(vec![FieldValue::structured("Tide Court", Some("Rulers".to_string()))]),
            locations: Some(vec![FieldValue::text("Harbor")]),
            hooks: Some(vec![FieldValue::text("A ship is missing")]),
        };
        let journal = JournalCompiler::compile("Saltreach", &lore);

        let names: Vec<&str> = journal.pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["World", "History", "Factions", "Locations", "Adventure Hooks"]);
        assert_eq!(journal.pages[0].text.content, "<p>An island.</p><p>Mostly rock.</p>");
        assert_eq!(
            journal.pages[2].text.content,
            "<ul><li><strong>Tide Court</strong>: Rulers</li></ul>"
        );
        assert_eq!(journal.pages[0].page_type, "text");
        assert_eq!(journal.pages[0].text.format, 1);
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let lore = NormalizedLore {
            world_description: Some("Dust.".to_string()),
            history: Some("   ".to_string()),
            factions: Some(vec![]),
            locations: None,
            hooks: Some(vec![FieldValue::text("Find water")]),
        };
        let journal = JournalCompiler::compile("Dustlands", &lore);
        let names: Vec<&str> = journal.pages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["World", "Adventure Hooks"]);
    }

    #[test]
    fn test_compile_lore_normalizes_first() {
        let journal = JournalCompiler::compile_lore(
            "Vale",
            &json!({"overview": "Green <hills>", "rumors": ["Wolves"]}),
        )
        .unwrap();
        assert_eq!(journal.pages.len(), 2);
        assert_eq!(journal.pages[0].text.content, "<p>Green &lt;hills&gt;</p>");
        assert!(JournalCompiler::compile_lore("Vale", &json!(true)).is_err());
    }

    #[test]
    fn test_scenario_is_single_page() {
        let journal = JournalCompiler::compile_scenario("Session 1", "Meet at the inn.\nBring rope.");
        assert_eq!(journal.pages.len(), 1);
        assert_eq!(journal.pages[0].name, "Scenario");
        assert_eq!(journal.pages[0].text.content, "<p>Meet at the inn.<br>Bring rope.</p>");
    }
}
