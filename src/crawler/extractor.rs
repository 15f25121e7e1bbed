//! Link and text extraction for ATC index pages
//!
//! Every index page lists its entries as links carrying the ATC code in the
//! query string. Intermediate levels show them as bold section headers
//! (`<p><b><a ...>`), the last level as rows of a data table. This module
//! turns one page into the records it shows and the links to recurse into.

use crate::AtcError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Content container on every page
const CONTENT_CONTAINER: &str = "#content";

/// The index page nests its content one level deeper
const ROOT_CONTENT_CONTAINER: &str = "#content > div > div";

/// Pattern that pulls the ATC code out of a link's href
const CODE_PATTERN: &str = r"code=(\S+)&";

/// One ATC code and its description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassificationRecord {
    /// Hierarchical ATC code, e.g. `A`, `A01`, `A01AA01`
    pub code: String,

    /// Text of the link describing the code
    pub label: String,
}

impl ClassificationRecord {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// A section-header link: a record that also has a page of its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLink {
    /// The raw href as written in the page
    pub href: String,

    /// Code and label of the linked subcategory
    pub record: ClassificationRecord,
}

/// Everything extracted from one page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageNode {
    /// Whether this is the index page
    pub is_root_page: bool,

    /// Section-header links; non-empty means the page has children
    pub child_links: Vec<ChildLink>,

    /// Data table entries of a leaf page
    pub leaf_entries: Vec<ClassificationRecord>,
}

impl PageNode {
    /// Returns true if the page links to subcategory pages
    pub fn has_children(&self) -> bool {
        !self.child_links.is_empty()
    }

    /// All records shown on the page, in document order
    pub fn records(&self) -> impl Iterator<Item = &ClassificationRecord> {
        self.child_links
            .iter()
            .map(|link| &link.record)
            .chain(self.leaf_entries.iter())
    }

    /// Number of records on the page
    pub fn record_count(&self) -> usize {
        self.child_links.len() + self.leaf_entries.len()
    }
}

/// Compiled selectors for one page layout
#[derive(Debug)]
struct Layout {
    section_links: Selector,
    table_links: Selector,
}

impl Layout {
    fn new(container: &str) -> Result<Self, AtcError> {
        Ok(Self {
            section_links: create_selector(&format!("{} > p > b a", container))?,
            table_links: create_selector(&format!("{} table a", container))?,
        })
    }
}

/// Extracts records and child links from ATC index pages
///
/// Selectors and the code pattern are compiled once; extraction itself is a
/// pure function of the page content.
#[derive(Debug)]
pub struct Extractor {
    root: Layout,
    page: Layout,
    code_pattern: Regex,
}

impl Extractor {
    /// Creates an extractor, compiling its selectors
    pub fn new() -> Result<Self, AtcError> {
        Ok(Self {
            root: Layout::new(ROOT_CONTENT_CONTAINER)?,
            page: Layout::new(CONTENT_CONTAINER)?,
            code_pattern: Regex::new(CODE_PATTERN)
                .map_err(|e| AtcError::Selector(format!("{}: {}", CODE_PATTERN, e)))?,
        })
    }

    /// Extracts the records and child links shown on a page
    ///
    /// # Extraction Rules
    ///
    /// 1. Locate the content container (one level deeper on the index page)
    /// 2. Collect the section-header links; if there are any, they are the
    ///    page's children
    /// 3. Otherwise collect the links of the data table as leaf entries
    /// 4. The code of each link comes from its href, the label is all of
    ///    the link's text nodes concatenated
    ///
    /// # Errors
    ///
    /// Returns `AtcError::StructuralMismatch` when the number of codes found
    /// differs from the number of labels. Nothing from such a page is
    /// returned.
    ///
    /// # Example
    ///
    /// ```
    /// use atc_spider::crawler::Extractor;
    ///
    /// let html = r#"<div id="content"><p><b><a href="./?code=A01&showdescription=no">STOMATOLOGICAL PREPARATIONS</a></b></p></div>"#;
    /// let page = Extractor::new().unwrap().extract(html, false).unwrap();
    /// assert!(page.has_children());
    /// assert_eq!(page.child_links[0].record.code, "A01");
    /// ```
    pub fn extract(&self, html: &str, is_root_page: bool) -> Result<PageNode, AtcError> {
        let document = Html::parse_document(html);
        let layout = if is_root_page { &self.root } else { &self.page };

        let mut links: Vec<ElementRef> = document.select(&layout.section_links).collect();
        let has_children = !links.is_empty();
        if !has_children {
            links = document.select(&layout.table_links).collect();
        }

        let hrefs: Vec<Option<&str>> = links.iter().map(|link| link.value().attr("href")).collect();
        let codes: Vec<Option<String>> = hrefs
            .iter()
            .map(|href| href.and_then(|h| self.parse_code(h)))
            .collect();
        let labels: Vec<String> = links.iter().map(|link| link.text().collect()).collect();

        let code_count = codes.iter().filter(|code| code.is_some()).count();
        if code_count != labels.len() {
            return Err(AtcError::StructuralMismatch {
                codes: code_count,
                labels: labels.len(),
            });
        }

        // Counts match, so every link carries an href and a code
        let entries = hrefs
            .into_iter()
            .zip(codes)
            .zip(labels)
            .filter_map(|((href, code), label)| Some((href?, ClassificationRecord::new(code?, label))));

        let mut page = PageNode {
            is_root_page,
            ..PageNode::default()
        };
        if has_children {
            page.child_links = entries
                .map(|(href, record)| ChildLink {
                    href: href.to_string(),
                    record,
                })
                .collect();
        } else {
            page.leaf_entries = entries.map(|(_, record)| record).collect();
        }

        Ok(page)
    }

    /// Pulls the ATC code out of an href (`...code=<code>&...`)
    pub fn parse_code(&self, href: &str) -> Option<String> {
        self.code_pattern
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Convenience function for one-off extraction
pub fn extract(html: &str, is_root_page: bool) -> Result<PageNode, AtcError> {
    Extractor::new()?.extract(html, is_root_page)
}

#[inline]
fn create_selector(selector: &str) -> Result<Selector, AtcError> {
    Selector::parse(selector).map_err(|e| AtcError::Selector(format!("{}: {:?}", selector, e)))
}
