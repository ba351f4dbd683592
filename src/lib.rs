//! # deckcover
//!
//! Wraps an existing PDF deck in a branded report:
//!
//! - **Cover page**: logo, title, tracker link, a fitted cover image and the
//!   status sections, drawn on a canvas sized to the deck
//! - **Body**: every deck page, or the pages from the first one mentioning a
//!   marker phrase onwards
//! - **Closing page**: a glossary header above the team slide image
//!
//! The result is written as `output{YYYYMMDD}.pdf`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckcover::content::Variant;
//! use deckcover::report::ReportBuilder;
//!
//! match ReportBuilder::new(Variant::Full).with_input_dir("inputs").run() {
//!     Ok(Some(summary)) => println!("wrote {}", summary.output.display()),
//!     Ok(None) => println!("nothing to do"),
//!     Err(e) => eprintln!("{:#}", e),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`discovery`]: newest deck and cover image in the input directory
//! - [`deck`]: loading decks, marker search and output assembly
//! - [`canvas`]: single-page drawing surface
//! - [`layout`]: cover and closing page layouts
//! - [`content`]: compiled-in text and colors per variant
//! - [`image`]: image decoding, fitting and PDF embedding
//! - [`report`]: the end-to-end pipeline
//!
//! ### Rendering a cover page on its own
//!
//! ```rust
//! use deckcover::content::Variant;
//! use deckcover::layout::render_cover_page;
//! use deckcover::pdf_generator::PageSize;
//!
//! let pdf = render_cover_page(PageSize::widescreen(), Variant::Full.content(), None)
//!     .expect("cover renders");
//! assert!(pdf.starts_with(b"%PDF-"));
//! ```

pub mod canvas;
pub mod compression;
pub mod content;
pub mod deck;
pub mod discovery;
pub mod fonts;
pub mod image;
pub mod layout;
pub mod logging;
pub mod pdf_generator;
pub mod report;
