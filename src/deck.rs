//! Source deck access and output assembly.
//!
//! Decks are read with `lopdf`. Assembly follows the usual lopdf merge
//! recipe: renumber each imported document past the objects already taken,
//! copy everything except the structural nodes, then rebuild a single flat
//! `/Pages` tree with the chosen pages in order.

use anyhow::{Context, Result, anyhow};
use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::pdf_generator::PageSize;

/// Page attributes a `/Page` may inherit from its ancestors
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against cyclic `/Parent` chains in damaged files
const MAX_TREE_DEPTH: usize = 64;

/// An input deck loaded into memory
#[derive(Debug, Clone)]
pub struct SourceDeck {
    document: Document,
}

impl SourceDeck {
    pub fn load(path: &Path) -> Result<Self> {
        let document = Document::load(path)
            .with_context(|| format!("Failed to load PDF {}", path.display()))?;
        Self::from_document(document)
    }

    pub fn load_mem(bytes: &[u8]) -> Result<Self> {
        let document = Document::load_mem(bytes).context("Failed to parse PDF data")?;
        Self::from_document(document)
    }

    pub fn from_document(document: Document) -> Result<Self> {
        if document.get_pages().is_empty() {
            return Err(anyhow!("PDF has no pages"));
        }
        Ok(SourceDeck { document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Size of the first page, from its (possibly inherited) MediaBox
    pub fn page_size(&self) -> Result<PageSize> {
        let pages = self.document.get_pages();
        let first = pages
            .values()
            .next()
            .copied()
            .ok_or_else(|| anyhow!("PDF has no pages"))?;
        let media_box = inherited_attribute(&self.document, first, b"MediaBox")
            .ok_or_else(|| anyhow!("First page has no MediaBox"))?;
        let media_box = resolve(&self.document, &media_box)?;
        let corners = media_box
            .as_array()
            .map_err(|_| anyhow!("MediaBox is not an array"))?
            .iter()
            .map(|o| resolve(&self.document, o).and_then(number))
            .collect::<Result<Vec<f32>>>()?;
        if corners.len() != 4 {
            return Err(anyhow!("MediaBox must have 4 numbers, found {}", corners.len()));
        }
        Ok(PageSize::new(
            (corners[2] - corners[0]).abs(),
            (corners[3] - corners[1]).abs(),
        ))
    }

    /// Extracted text of a 1-indexed page
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.document
            .extract_text(&[page_number])
            .with_context(|| format!("Failed to extract text from page {}", page_number))
    }

    /// First page (1-indexed) whose text contains `marker`.
    ///
    /// A page whose text cannot be extracted is treated as not matching.
    pub fn find_marker_page(&self, marker: &str) -> Option<u32> {
        let texts = (1..=self.page_count()).map(|n| match self.page_text(n) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = n, error = %e, "skipping page during marker search");
                String::new()
            }
        });
        first_page_containing(texts, marker)
    }
}

/// Which deck pages make up the report body
#[derive(Debug, Clone, PartialEq)]
pub enum BodySelection {
    All,
    FromMarker(String),
}

/// Resolved body pages plus where the marker was found, if one was searched for
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPages {
    pub pages: Vec<u32>,
    pub marker_page: Option<u32>,
}

impl BodySelection {
    /// Resolve to 1-indexed page numbers. A marker that never appears
    /// selects no pages at all.
    pub fn resolve(&self, deck: &SourceDeck) -> BodyPages {
        let count = deck.page_count();
        match self {
            BodySelection::All => BodyPages {
                pages: (1..=count).collect(),
                marker_page: None,
            },
            BodySelection::FromMarker(marker) => match deck.find_marker_page(marker) {
                Some(start) => {
                    tracing::info!(marker = %marker, page = start, "marker found");
                    BodyPages {
                        pages: (start..=count).collect(),
                        marker_page: Some(start),
                    }
                }
                None => {
                    tracing::warn!(
                        marker = %marker,
                        pages = count,
                        "marker not found in deck; report body will be empty"
                    );
                    BodyPages {
                        pages: Vec::new(),
                        marker_page: None,
                    }
                }
            },
        }
    }
}

fn whitespace() -> &'static Regex {
    static WS: OnceLock<Regex> = OnceLock::new();
    WS.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// Collapse whitespace runs so markers split across text lines still match
pub fn normalize_text(text: &str) -> String {
    whitespace().replace_all(text.trim(), " ").into_owned()
}

/// Index (1-based) of the first text containing `marker`
pub fn first_page_containing<I>(texts: I, marker: &str) -> Option<u32>
where
    I: IntoIterator<Item = String>,
{
    let marker = normalize_text(marker);
    if marker.is_empty() {
        return None;
    }
    texts
        .into_iter()
        .position(|text| normalize_text(&text).contains(&marker))
        .map(|i| i as u32 + 1)
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => doc
            .get_object(*id)
            .with_context(|| format!("Dangling reference {} {} R", id.0, id.1)),
        other => Ok(other),
    }
}

fn number(object: &Object) -> Result<f32> {
    match object {
        Object::Integer(i) => Ok(*i as f32),
        Object::Real(r) => Ok(*r as f32),
        other => Err(anyhow!("Expected a number, found {:?}", other)),
    }
}

/// Look up `key` on a page, walking up `/Parent` links when it is absent
fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Copy of the page dictionary with inherited attributes made explicit
fn flatten_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc
        .get_dictionary(page_id)
        .with_context(|| format!("Page object {} {} R is not a dictionary", page_id.0, page_id.1))?
        .clone();
    for key in INHERITABLE {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(doc, page_id, key) {
            page.set(key.to_vec(), value);
        }
    }
    Ok(page)
}

fn is_structural(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline")
    )
}

/// Builds the output document page by page
pub struct DeckAssembler {
    document: Document,
    next_id: u32,
    kids: Vec<ObjectId>,
}

impl DeckAssembler {
    pub fn new() -> Self {
        DeckAssembler {
            document: Document::with_version("1.5"),
            next_id: 1,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append every page of a rendered PDF (a finished canvas)
    pub fn append_rendered(&mut self, pdf: &[u8]) -> Result<()> {
        let doc = Document::load_mem(pdf).context("Failed to parse rendered page")?;
        let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        self.import(doc, &numbers)
    }

    /// Append the given 1-indexed pages of a deck, in the order listed
    pub fn append_deck_pages(&mut self, deck: &SourceDeck, pages: &[u32]) -> Result<()> {
        if pages.is_empty() {
            return Ok(());
        }
        self.import(deck.document().clone(), pages)
    }

    fn import(&mut self, mut doc: Document, page_numbers: &[u32]) -> Result<()> {
        doc.renumber_objects_with(self.next_id);
        self.next_id = doc.max_id + 1;

        let page_ids = doc.get_pages();
        let mut pages = Vec::with_capacity(page_numbers.len());
        for number in page_numbers {
            let page_id = *page_ids
                .get(number)
                .ok_or_else(|| anyhow!("Page {} out of range (1..={})", number, page_ids.len()))?;
            pages.push((page_id, flatten_page(&doc, page_id)?));
        }

        for (id, object) in doc.objects {
            if !is_structural(&object) {
                self.document.objects.insert(id, object);
            }
        }
        for (id, page) in pages {
            self.document.objects.insert(id, Object::Dictionary(page));
            self.kids.push(id);
        }
        Ok(())
    }

    /// Build the page tree and catalog, then drop anything unreachable
    pub fn finish(mut self) -> Result<Document> {
        if self.kids.is_empty() {
            return Err(anyhow!("No pages to assemble"));
        }

        self.document.max_id = self.next_id;
        let pages_id = self.document.new_object_id();
        for kid in &self.kids {
            if let Ok(Object::Dictionary(page)) = self.document.get_object_mut(*kid) {
                page.set("Parent", Object::Reference(pages_id));
            }
        }

        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let pruned = self.document.prune_objects();
        self.document.renumber_objects();
        self.document.compress();
        tracing::debug!(pages = count, pruned = pruned.len(), "assembled output document");
        Ok(self.document)
    }
}

impl Default for DeckAssembler {
    fn default() -> Self {
        Self::new()
    }
}
