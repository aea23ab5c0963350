//! Word document generation.
//!
//! [`DocxWriter`] renders either line-oriented markup (see [`crate::markup`])
//! or a [`StructuredReport`] into a new `.docx` package. The building blocks
//! (runs, paragraphs, section setup, style sheet) are crate-private; callers
//! only see the two entry points and their inputs.

pub(crate) mod doc;
pub(crate) mod paragraph;
pub(crate) mod run;
pub(crate) mod section;
pub(crate) mod style;

use crate::common::error::{Error, Result};
use crate::common::format::{Format, FormatRegistry};
use crate::markup::{self, ContentBlock};
use crate::sheet::payload::scalar_text;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, error, info};

use doc::DocumentBuilder;
use paragraph::Paragraph;
use run::Run;
use style::{STYLE_HEADING_1, STYLE_LIST_BULLET, STYLE_LIST_NUMBER, heading_style};

/// Space after body paragraphs, in points.
const BODY_SPACE_AFTER_PT: f64 = 6.0;
/// Space after the executive summary, in points.
const SUMMARY_SPACE_AFTER_PT: f64 = 12.0;
const TITLE_SIZE_PT: f64 = 16.0;

/// Style options of [`DocxWriter::create_document`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_name: String,
    /// Body font size in points
    pub font_size: f64,
    /// Multiple of single line spacing
    pub line_spacing: f64,
    /// Applied to all four page margins
    #[serde(alias = "margins")]
    pub margins_inches: f64,
    pub add_page_numbers: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: "Calibri".to_string(),
            font_size: 11.0,
            line_spacing: 1.15,
            margins_inches: 1.0,
            add_page_numbers: true,
        }
    }
}

impl StyleConfig {
    /// Check the options once before any document is built.
    pub fn validate(&self) -> Result<()> {
        if self.font_name.trim().is_empty() {
            return Err(Error::InvalidConfig("font_name must not be empty".into()));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0 && self.font_size <= 1638.0) {
            return Err(Error::InvalidConfig(format!(
                "font_size must be between 0 and 1638 points, got {}",
                self.font_size
            )));
        }
        if !(self.line_spacing.is_finite() && self.line_spacing > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "line_spacing must be positive, got {}",
                self.line_spacing
            )));
        }
        // both side margins must leave room on a letter-size page
        if !(self.margins_inches.is_finite()
            && self.margins_inches >= 0.0
            && self.margins_inches < 4.0)
        {
            return Err(Error::InvalidConfig(format!(
                "margins_inches must be in [0, 4), got {}",
                self.margins_inches
            )));
        }
        Ok(())
    }
}

/// Content of a report section: a bulleted list or a single paragraph.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ReportContent {
    List(Vec<Value>),
    Text(Value),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportSubsection {
    pub title: Option<String>,
    pub content: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub title: Option<String>,
    pub content: Option<ReportContent>,
    pub subsections: Vec<ReportSubsection>,
}

/// Input of [`DocxWriter::create_structured_report`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StructuredReport {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub sections: Vec<ReportSection>,
}

impl StructuredReport {
    pub fn from_json(value: &Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| Error::InvalidData(format!("report structure: {e}")))
    }
}

/// Word document writer.
#[derive(Debug, Clone, Default)]
pub struct DocxWriter {
    registry: FormatRegistry,
}

impl DocxWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: FormatRegistry) -> Self {
        Self { registry }
    }

    /// Render markup into a new document at `dest`.
    ///
    /// An optional non-empty `title` becomes a centered level-1 heading. On
    /// success the returned text names the created file.
    ///
    /// # Errors
    /// `DependencyMissing` when Word output is disabled in the registry;
    /// anything else is wrapped as `DOCX oluşturma hatası: <cause>`.
    pub fn create_document<P: AsRef<Path>>(
        &self,
        markup: &str,
        dest: P,
        title: Option<&str>,
        style: &StyleConfig,
    ) -> Result<String> {
        let dest = dest.as_ref();
        self.registry.require(Format::Docx)?;
        debug!(path = %dest.display(), "creating document");

        let result = (|| {
            style.validate()?;
            let doc = build_document(&markup::parse(markup), title, style);
            doc.save(dest)
        })();

        match result {
            Ok(()) => {
                info!(path = %dest.display(), "document created");
                Ok(format!("DOCX belgesi başarıyla oluşturuldu: {}", dest.display()))
            },
            Err(err) => {
                error!(path = %dest.display(), error = %err, "document creation failed");
                Err(err.context("DOCX oluşturma hatası"))
            },
        }
    }

    /// Render a title/summary/sections report into a new document at `dest`.
    ///
    /// # Errors
    /// `DependencyMissing` when Word output is disabled in the registry;
    /// anything else is wrapped as
    /// `Yapılandırılmış rapor oluşturma hatası: <cause>`.
    pub fn create_structured_report<P: AsRef<Path>>(
        &self,
        report: &StructuredReport,
        dest: P,
    ) -> Result<String> {
        let dest = dest.as_ref();
        self.registry.require(Format::Docx)?;
        debug!(path = %dest.display(), sections = report.sections.len(), "creating structured report");

        match build_report(report).save(dest) {
            Ok(()) => {
                info!(path = %dest.display(), "structured report created");
                Ok(format!("Yapılandırılmış rapor oluşturuldu: {}", dest.display()))
            },
            Err(err) => {
                error!(path = %dest.display(), error = %err, "structured report failed");
                Err(err.context("Yapılandırılmış rapor oluşturma hatası"))
            },
        }
    }
}

fn body_run(text: &str, style: &StyleConfig) -> Run {
    Run::text(text)
        .font_name(&style.font_name)
        .font_size_pt(style.font_size)
}

fn body_paragraph(style_id: Option<&'static str>, style: &StyleConfig) -> Paragraph {
    let mut paragraph = Paragraph::new()
        .space_after_pt(BODY_SPACE_AFTER_PT)
        .line_spacing(style.line_spacing);
    paragraph.style = style_id;
    paragraph
}

fn build_document(blocks: &[ContentBlock], title: Option<&str>, style: &StyleConfig) -> DocumentBuilder {
    let mut doc = DocumentBuilder::new();
    doc.set_default_font(&style.font_name);
    doc.section_mut().set_uniform_margins(style.margins_inches);

    if let Some(title) = title.filter(|t| !t.is_empty()) {
        doc.set_title(title);
        doc.add(
            Paragraph::with_style(STYLE_HEADING_1).centered().with_run(
                Run::text(title)
                    .font_name(&style.font_name)
                    .font_size_pt(TITLE_SIZE_PT)
                    .bold(true),
            ),
        );
    }

    for block in blocks {
        match block {
            ContentBlock::Heading { level, text } => {
                doc.add(
                    Paragraph::with_style(heading_style(*level))
                        .with_run(Run::text(text).font_name(&style.font_name).bold(true)),
                );
            },
            ContentBlock::ListItem { ordered, text } => {
                let list_style = if *ordered {
                    STYLE_LIST_NUMBER
                } else {
                    STYLE_LIST_BULLET
                };
                doc.add(body_paragraph(Some(list_style), style).with_run(body_run(text, style)));
            },
            ContentBlock::Paragraph { spans } => {
                let paragraph = doc.add(body_paragraph(None, style));
                for span in spans {
                    paragraph.push(body_run(&span.text, style).bold(span.bold));
                }
            },
            ContentBlock::Blank => {},
        }
    }

    if style.add_page_numbers {
        doc.add_page_numbers();
    }
    doc
}

fn build_report(report: &StructuredReport) -> DocumentBuilder {
    let mut doc = DocumentBuilder::new();

    if let Some(ref title) = report.title {
        doc.set_title(title);
        doc.add(Paragraph::with_style(STYLE_HEADING_1).centered().with_run(Run::text(title)));
    }

    if let Some(ref summary) = report.summary {
        doc.add_heading("EXECUTIVE SUMMARY", 2);
        doc.add(
            Paragraph::new()
                .space_after_pt(SUMMARY_SPACE_AFTER_PT)
                .with_run(Run::text(summary)),
        );
    }

    for section in &report.sections {
        doc.add_heading(section.title.as_deref().unwrap_or("Başlıksız Bölüm"), 2);
        match &section.content {
            Some(ReportContent::List(items)) => {
                for item in items {
                    doc.add_paragraph(&scalar_text(item), Some(STYLE_LIST_BULLET));
                }
            },
            Some(ReportContent::Text(value)) => {
                doc.add_paragraph(&scalar_text(value), None);
            },
            None => {},
        }
        for subsection in &section.subsections {
            doc.add_heading(subsection.title.as_deref().unwrap_or("Alt Başlık"), 3);
            if let Some(ref content) = subsection.content {
                doc.add_paragraph(&scalar_text(content), None);
            }
        }
    }
    doc
}
