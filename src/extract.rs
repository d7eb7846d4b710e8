use scraper::{ElementRef, Html, Selector};

use crate::error::{PipelineError, Result};
use crate::sources::{SelectorRules, SourceDescriptor};
use crate::store::ContentEntity;

struct CompiledRules {
    row: Selector,
    name: Selector,
    desc: Selector,
}

impl CompiledRules {
    fn compile(rules: &SelectorRules) -> Result<Self> {
        Ok(Self {
            row: compile(&rules.row)?,
            name: compile(&rules.name)?,
            desc: compile(&rules.desc)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PipelineError::Extraction {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Concatenated text of every match of `selector` inside `scope`, trimmed.
fn text_within(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Pull entity rows out of a fetched page.
///
/// Rows come back in document order. Rows without a name are dropped, and a
/// row selector that matches nothing yields an empty list.
pub fn extract_rows(html: &str, source: &SourceDescriptor) -> Result<Vec<ContentEntity>> {
    let rules = CompiledRules::compile(&source.selector)?;
    let document = Html::parse_document(html);

    let rows = document
        .select(&rules.row)
        .filter_map(|row| {
            let name = text_within(row, &rules.name);
            if name.is_empty() {
                return None;
            }
            let description = text_within(row, &rules.desc);
            Some(ContentEntity::new(name, description))
        })
        .collect();

    Ok(rows)
}
