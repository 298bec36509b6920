//! Generic section → item → field walk over a markup page.
//!
//! A site is described by a `PageLayout`: where its main content lives, what
//! a section and an item look like, and how each named field is read from an
//! item. The walk itself is shared; only the layout differs per site.
//!
//! Sections and items are selected top-level only: an element nested inside
//! another element that matches the same selector is part of that element,
//! not a sibling of it.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};
use crate::normalize::TextRule;
use crate::period::Period;

fn default_required() -> bool {
    true
}

/// How one value is read relative to a scope element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    /// Relative selector; `None` reads from the scope element itself.
    #[serde(default)]
    pub selector: Option<String>,
    /// Which match of `selector` to read, in document order.
    #[serde(default)]
    pub nth: usize,
    /// Attribute to read; `None` reads the element text.
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub text: TextRule,
}

impl FieldRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: Some(selector.to_string()),
            nth: 0,
            attr: None,
            required: true,
            text: TextRule::collapsed(),
        }
    }

    pub fn attr(selector: Option<&str>, attr: &str) -> Self {
        Self {
            selector: selector.map(str::to_string),
            nth: 0,
            attr: Some(attr.to_string()),
            required: true,
            text: TextRule::default(),
        }
    }

    pub fn nth(mut self, nth: usize) -> Self {
        self.nth = nth;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_text(mut self, text: TextRule) -> Self {
        self.text = text;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub rule: FieldRule,
}

impl FieldSpec {
    pub fn new(name: &str, rule: FieldRule) -> Self {
        Self {
            name: name.to_string(),
            rule,
        }
    }
}

/// Declarative description of one site's page structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    /// Main content region; the first match is used.
    pub root: String,
    /// Section containers, relative to `root`.
    pub section: String,
    /// Section title, relative to the section.
    pub title: FieldRule,
    /// Appended to the title as ` (subtitle)` when present and non-empty.
    #[serde(default)]
    pub subtitle: Option<FieldRule>,
    /// Item containers, relative to the section.
    pub item: String,
    pub fields: Vec<FieldSpec>,
}

/// One item's extracted fields, in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItem {
    pub period: Period,
    pub section: String,
    fields: Vec<(String, String)>,
}

impl ExtractedItem {
    /// Value of a field the layout declares. Optional fields that were
    /// absent on the page read as `""`; undeclared names are an error.
    pub fn field(&self, name: &str) -> ScrapeResult<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| ScrapeError::MissingField(name.to_string()))
    }
}

pub(crate) fn parse_selector(selector: &str) -> ScrapeResult<Selector> {
    Selector::parse(selector).map_err(|_| ScrapeError::Selector(selector.to_string()))
}

/// Matches of `selector` below `scope` that have no matching ancestor
/// between themselves and `scope`.
pub fn select_top_level<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    scope
        .select(selector)
        .filter(|element| {
            !element
                .ancestors()
                .take_while(|node| node.id() != scope.id())
                .filter_map(ElementRef::wrap)
                .any(|ancestor| selector.matches(&ancestor))
        })
        .collect()
}

struct CompiledRule<'l> {
    rule: &'l FieldRule,
    selector: Option<Selector>,
}

impl<'l> CompiledRule<'l> {
    fn new(rule: &'l FieldRule) -> ScrapeResult<Self> {
        let selector = rule.selector.as_deref().map(parse_selector).transpose()?;
        Ok(Self { rule, selector })
    }

    fn read(&self, scope: ElementRef<'_>, context: &str) -> ScrapeResult<Option<String>> {
        let label = self.rule.selector.as_deref().unwrap_or(":scope");

        let target = match &self.selector {
            Some(selector) => scope.select(selector).nth(self.rule.nth),
            None => Some(scope),
        };

        let Some(element) = target else {
            return if self.rule.required {
                Err(ScrapeError::MissingElement {
                    selector: label.to_string(),
                    context: context.to_string(),
                })
            } else {
                Ok(None)
            };
        };

        let raw = match &self.rule.attr {
            Some(attr) => match element.value().attr(attr) {
                Some(value) => value.to_string(),
                None if self.rule.required => {
                    return Err(ScrapeError::MissingAttribute {
                        attr: attr.clone(),
                        selector: label.to_string(),
                    })
                }
                None => return Ok(None),
            },
            None => element.text().collect::<String>(),
        };

        Ok(Some(self.rule.text.apply(&raw)))
    }
}

/// A `PageLayout` with every selector parsed once.
pub struct CompiledLayout<'l> {
    root: Selector,
    section: Selector,
    item: Selector,
    title: CompiledRule<'l>,
    subtitle: Option<CompiledRule<'l>>,
    fields: Vec<(&'l str, CompiledRule<'l>)>,
    root_label: &'l str,
}

impl<'l> CompiledLayout<'l> {
    pub fn new(layout: &'l PageLayout) -> ScrapeResult<Self> {
        Ok(Self {
            root: parse_selector(&layout.root)?,
            section: parse_selector(&layout.section)?,
            item: parse_selector(&layout.item)?,
            title: CompiledRule::new(&layout.title)?,
            subtitle: layout.subtitle.as_ref().map(CompiledRule::new).transpose()?,
            fields: layout
                .fields
                .iter()
                .map(|spec| CompiledRule::new(&spec.rule).map(|rule| (spec.name.as_str(), rule)))
                .collect::<ScrapeResult<Vec<_>>>()?,
            root_label: &layout.root,
        })
    }

    pub fn extract(&self, document: &Html, period: Period) -> ScrapeResult<Vec<ExtractedItem>> {
        let root = document
            .select(&self.root)
            .next()
            .ok_or_else(|| ScrapeError::MissingElement {
                selector: self.root_label.to_string(),
                context: format!("page for {}", period.year),
            })?;

        let mut items = Vec::new();

        for (section_index, section) in select_top_level(root, &self.section).into_iter().enumerate() {
            let context = format!("section {} of {}", section_index + 1, period.year);

            let mut title = self.title.read(section, &context)?.unwrap_or_default();
            if let Some(subtitle) = &self.subtitle {
                if let Some(comment) = subtitle.read(section, &context)?.filter(|c| !c.is_empty()) {
                    title = format!("{} ({})", title, comment);
                }
            }

            for (item_index, item) in select_top_level(section, &self.item).into_iter().enumerate() {
                let context = format!("item {} of `{}` ({})", item_index + 1, title, period.year);

                let mut fields = Vec::with_capacity(self.fields.len());
                for (name, rule) in &self.fields {
                    let value = rule.read(item, &context)?.unwrap_or_default();
                    fields.push((name.to_string(), value));
                }

                items.push(ExtractedItem {
                    period,
                    section: title.clone(),
                    fields,
                });
            }
        }

        Ok(items)
    }
}

/// Parse `html` and walk it with `layout`.
pub fn extract(html: &str, layout: &PageLayout, period: Period) -> ScrapeResult<Vec<ExtractedItem>> {
    let compiled = CompiledLayout::new(layout)?;
    let document = Html::parse_document(html);
    compiled.extract(&document, period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> PageLayout {
        PageLayout {
            root: "main".to_string(),
            section: ".section".to_string(),
            title: FieldRule::text("h2"),
            subtitle: Some(FieldRule::text("h3").optional()),
            item: "div.list_item".to_string(),
            fields: vec![
                FieldSpec::new("image", FieldRule::attr(None, "data-over-src")),
                FieldSpec::new("link", FieldRule::attr(Some("a"), "href")),
                FieldSpec::new("subject", FieldRule::text("a")),
                FieldSpec::new(
                    "credit",
                    FieldRule::text("span").optional().with_text(TextRule {
                        collapse_whitespace: true,
                        leading_words: vec!["de".to_string()],
                        ..TextRule::default()
                    }),
                ),
            ],
        }
    }

    const PERIOD: Period = Period { year: 2019, edition: 72 };

    #[test]
    fn test_two_sections_in_order() {
        let html = r#"
            <html><body><main>
              <div class="section">
                <h2>Competition</h2>
                <div class="list_item" data-over-src="/img/parasite.jpg" src="/img/blank.gif">
                  <a href="/film/parasite">  Parasite
                     (Gisaengchung) </a>
                  <span>de Bong Joon Ho</span>
                </div>
              </div>
              <div class="section">
                <h2>Un Certain Regard</h2>
                <h3>Opening film</h3>
                <div class="list_item" data-over-src="/img/girl.jpg">
                  <a href="/film/girl">Girl</a>
                </div>
              </div>
            </main></body></html>
        "#;

        let items = extract(html, &layout(), PERIOD).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].section, "Competition");
        assert_eq!(items[0].period, PERIOD);
        assert_eq!(items[0].field("subject").unwrap(), "Parasite (Gisaengchung)");
        assert_eq!(items[0].field("credit").unwrap(), "Bong Joon Ho");
        assert_eq!(items[0].field("image").unwrap(), "/img/parasite.jpg");
        assert_eq!(items[0].field("link").unwrap(), "/film/parasite");

        assert_eq!(items[1].section, "Un Certain Regard (Opening film)");
        assert_eq!(items[1].period, PERIOD);
        assert_eq!(items[1].field("credit").unwrap(), "");
    }

    #[test]
    fn test_nested_sections_are_not_top_level() {
        let html = r#"
            <main>
              <div class="section">
                <h2>Outer</h2>
                <div class="list_item" data-over-src="a.jpg"><a href="/a">A</a></div>
                <div class="section">
                  <h2>Inner</h2>
                  <div class="list_item" data-over-src="b.jpg"><a href="/b">B</a></div>
                </div>
              </div>
            </main>
        "#;

        let items = extract(html, &layout(), PERIOD).unwrap();
        let sections: Vec<_> = items.iter().map(|i| i.section.as_str()).collect();
        assert_eq!(sections, vec!["Outer", "Outer"]);
    }

    #[test]
    fn test_missing_required_attribute_fails_page() {
        let html = r#"
            <main><div class="section"><h2>Competition</h2>
              <div class="list_item"><a href="/x">X</a></div>
            </div></main>
        "#;

        let err = extract(html, &layout(), PERIOD).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingAttribute { .. }));
    }

    #[test]
    fn test_missing_root_fails_page() {
        let err = extract("<html><body></body></html>", &layout(), PERIOD).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingElement { .. }));
    }

    #[test]
    fn test_undeclared_field_is_an_error() {
        let html = r#"<main><div class="section"><h2>T</h2>
            <div class="list_item" data-over-src="a.jpg"><a href="/a">A</a></div></div></main>"#;
        let items = extract(html, &layout(), PERIOD).unwrap();
        assert!(items[0].field("award").is_err());
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let html = r#"<main><div class="section"><h2>T</h2>
            <div class="list_item" data-over-src="a.jpg"><a href="/a">A</a></div></div></main>"#;
        assert_eq!(
            extract(html, &layout(), PERIOD).unwrap(),
            extract(html, &layout(), PERIOD).unwrap()
        );
    }
}
