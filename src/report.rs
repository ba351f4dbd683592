//! End-to-end report generation.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::Variant;
use crate::deck::{BodySelection, DeckAssembler, SourceDeck};
use crate::discovery::{self, InputSet};
use crate::layout;

/// Default directory scanned for the deck and images
pub const DEFAULT_INPUT_DIR: &str = "inputs";

/// Dated output file name, e.g. `output20250131.pdf`
pub fn output_file_name(date: NaiveDate) -> String {
    format!("output{}.pdf", date.format("%Y%m%d"))
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub output: PathBuf,
    pub variant: Variant,
    pub deck_pages: u32,
    pub body_pages: usize,
    pub marker: Option<String>,
    pub marker_page: Option<u32>,
    pub cover_included: bool,
    pub closing_included: bool,
    pub total_pages: usize,
}

/// Configures and runs one report
///
/// # Example
/// ```rust,no_run
/// use deckcover::content::Variant;
/// use deckcover::report::ReportBuilder;
///
/// let summary = ReportBuilder::new(Variant::Marker)
///     .with_input_dir("inputs")
///     .with_marker("Key Findings")
///     .run();
/// ```
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    variant: Variant,
    input_dir: PathBuf,
    output_dir: PathBuf,
    marker: Option<String>,
    date: NaiveDate,
}

impl ReportBuilder {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from("."),
            marker: None,
            date: Local::now().date_naive(),
        }
    }

    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Select the body from the first page containing `marker`, whatever
    /// the variant
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    /// Date stamped into the output name (defaults to today, local time)
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn selection(&self) -> BodySelection {
        match self.marker.as_deref().or(self.variant.default_marker()) {
            Some(marker) => BodySelection::FromMarker(marker.to_string()),
            None => BodySelection::All,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(output_file_name(self.date))
    }

    /// Discover inputs and build the report. `Ok(None)` means there was
    /// nothing to do.
    pub fn run(&self) -> Result<Option<ReportSummary>> {
        match discovery::find_latest_files(&self.input_dir)? {
            Some(inputs) => self.build(&inputs).map(Some),
            None => Ok(None),
        }
    }

    /// Build the report from explicit inputs
    pub fn build(&self, inputs: &InputSet) -> Result<ReportSummary> {
        let deck = SourceDeck::load(&inputs.deck)?;
        let page = deck.page_size()?;
        tracing::info!(
            deck = %inputs.deck.display(),
            pages = deck.page_count(),
            width = page.width,
            height = page.height,
            "loaded deck"
        );

        let content = self.variant.content();
        let selection = self.selection();
        let body = selection.resolve(&deck);

        let mut assembler = DeckAssembler::new();
        let cover_included = append_rendered_page(&mut assembler, "cover", || {
            layout::render_cover_page(page, content, Some(inputs.cover_image.as_path()))
        });
        assembler.append_deck_pages(&deck, &body.pages)?;
        let closing_included = match inputs.team_slide.as_deref().filter(|p| p.exists()) {
            Some(team_slide) => append_rendered_page(&mut assembler, "closing", || {
                layout::render_team_slide(page, content, Some(team_slide))
            }),
            None => {
                tracing::info!("no team slide image; leaving out the closing page");
                false
            }
        };
        let total_pages = assembler.page_count();

        let mut document = assembler.finish()?;
        let output = self.output_path();
        ensure_dir(&self.output_dir)?;
        document
            .save(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        tracing::info!(output = %output.display(), pages = total_pages, "report written");

        Ok(ReportSummary {
            output,
            variant: self.variant,
            deck_pages: deck.page_count(),
            body_pages: body.pages.len(),
            marker: match selection {
                BodySelection::FromMarker(marker) => Some(marker),
                BodySelection::All => None,
            },
            marker_page: body.marker_page,
            cover_included,
            closing_included,
            total_pages,
        })
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    Ok(())
}

/// Render a synthetic page and append it. A failure is logged and the page
/// left out of the report.
fn append_rendered_page<F>(assembler: &mut DeckAssembler, label: &str, render: F) -> bool
where
    F: FnOnce() -> Result<Vec<u8>>,
{
    match render().and_then(|pdf| assembler.append_rendered(&pdf)) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(page = label, "failed to render page, skipping it: {:#}", e);
            false
        }
    }
}
