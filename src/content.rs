//! Compiled-in client content for each report variant.

use clap::ValueEnum;
use serde::Serialize;

use crate::canvas::Color;

/// Marker searched for by the [`Variant::Marker`] report when no override
/// is given on the command line
pub const DEFAULT_MARKER: &str = "Executive Summary";

/// Fixed file name of the closing-page image in the input directory
pub const TEAM_SLIDE_FILE: &str = "team-slide.png";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Cover + every deck page + closing page
    Full,
    /// Cover + deck pages from the first marker page onwards + closing page
    Marker,
}

impl Variant {
    pub fn content(&self) -> &'static ReportContent {
        match self {
            Variant::Full => &EXECUTIVE_SUMMARY,
            Variant::Marker => &EXECUTIVE_SUMMARY_FROM_MARKER,
        }
    }

    pub fn default_marker(&self) -> Option<&'static str> {
        match self {
            Variant::Full => None,
            Variant::Marker => Some(DEFAULT_MARKER),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub brand: Color,
    pub text: Color,
    pub link: Color,
    pub rule: Color,
}

pub const PALETTE: Palette = Palette {
    background: Color::WHITE,
    brand: Color::hex(0x6B46C1),
    text: Color::hex(0x1A1A1A),
    link: Color::hex(0x2563EB),
    rule: Color::hex(0xE5E7EB),
};

#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub title: &'static str,
    pub items: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct ReportContent {
    pub brand: &'static str,
    pub title: &'static str,
    pub link_text: &'static str,
    pub link_url: &'static str,
    pub sections: &'static [Section],
    pub priorities_title: &'static str,
    pub priorities: &'static [&'static str],
    pub closing_title: &'static str,
    pub palette: Palette,
}

const SECTIONS: &[Section] = &[
    Section {
        title: "Work Done",
        items: &[
            "Continued Integration of Platform",
            "Mapping Out and Categorizing the DB Site by Page Type",
        ],
    },
    Section {
        title: "Outcomes",
        items: &[
            "Creating Shared Executive Summary",
            "Adapting Plans from PageWorkers to PageWorkers and...",
        ],
    },
    Section {
        title: "Next in Queue",
        items: &[
            "Speed Up Integration",
            "Shrinking Site Bloat & Reversing Technical Issues",
        ],
    },
];

const PRIORITIES: &[&str] = &[
    "Wedding Content Calendar",
    "Main Menu Render Review",
    "Inconsistend PDPs",
    "Internal Link Review",
    "Core Web Vitals (Page Speed) Analysis",
    "XML Sitemap Optimization",
];

const TRACKER_URL: &str = "https://docs.google.com/spreadsheets/d/1HMzI-RnBOOZZjTNa9BvBcbpBDSD8ZP-rEctoP-e25ZE/edit?gid=1098252974#gid=1098252974";

pub const EXECUTIVE_SUMMARY: ReportContent = ReportContent {
    brand: "botify",
    title: "David's Bridal Executive Summary",
    link_text: "David's Bridal Project Tracker Sheet",
    link_url: TRACKER_URL,
    sections: SECTIONS,
    priorities_title: "Current Key Priorities",
    priorities: PRIORITIES,
    closing_title: "Glossary",
    palette: PALETTE,
};

pub const EXECUTIVE_SUMMARY_FROM_MARKER: ReportContent = ReportContent {
    title: "David's Bridal Monthly Report",
    ..EXECUTIVE_SUMMARY
};
