//! Fixed style overrides applied to compiled DOCX files.
//!
//! A DOCX file is a zip archive of XML parts. Two parts are rewritten:
//!
//! - `word/styles.xml`: the `Normal` paragraph style gets the base font, size
//!   and line spacing (its previous `w:pPr`/`w:rPr` are replaced; a `Normal`
//!   style is added if the compiler emitted none)
//! - `word/document.xml`: every `w:sectPr` gets the page margins (an existing
//!   `w:pgMar` keeps its header, footer and gutter values)
//!
//! All other parts are copied unchanged.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_PART: &str = "word/document.xml";

const STYLES: &[u8] = b"w:styles";
const STYLE: &[u8] = b"w:style";
const SECT_PR: &[u8] = b"w:sectPr";
const PG_SZ: &[u8] = b"w:pgSz";
const PG_MAR: &str = "w:pgMar";

/// `w:sectPr` children that precede `w:pgMar` when there is no `w:pgSz`.
const BEFORE_PG_MAR: &[&[u8]] = &[
    b"w:headerReference",
    b"w:footerReference",
    b"w:footnotePr",
    b"w:endnotePr",
    b"w:type",
];

/// Margin attributes this module sets; others on `w:pgMar` are preserved.
const MARGIN_KEYS: [&[u8]; 4] = [b"w:top", b"w:right", b"w:bottom", b"w:left"];

/// Error rewriting a DOCX file.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be read or written.
    #[error("Invalid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A part is not well-formed XML.
    #[error("Invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An element has a malformed attribute.
    #[error("Invalid XML attribute: {0}")]
    XmlAttr(#[from] AttrError),

    /// A required part is absent from the archive.
    #[error("DOCX archive has no {0}")]
    MissingPart(&'static str),
}

/// Page margins in twentieths of a point (1440 per inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins {
    /// Top margin.
    pub top: u32,
    /// Bottom margin.
    pub bottom: u32,
    /// Left margin.
    pub left: u32,
    /// Right margin.
    pub right: u32,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            top: 1440,
            bottom: 1440,
            left: 1800,
            right: 1800,
        }
    }
}

/// Base document style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStyle {
    /// Font for Latin, East Asian and complex scripts.
    pub font: String,
    /// Font size in half-points.
    pub font_size: u32,
    /// Line spacing in 240ths of a line.
    pub line_spacing: u32,
    /// Page margins for every section.
    pub margins: PageMargins,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            font: "Microsoft YaHei".to_owned(),
            font_size: 22,
            line_spacing: 360,
            margins: PageMargins::default(),
        }
    }
}

impl DocumentStyle {
    /// Rewrite the DOCX at `path` in place.
    ///
    /// The new archive is written next to the original and renamed over it,
    /// so a failure leaves the original untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is not a readable DOCX archive or lacks
    /// the styles or document part.
    pub fn apply(&self, path: &Path) -> Result<(), StyleError> {
        let mut archive = ZipArchive::new(BufReader::new(File::open(path)?))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut rewritten = tempfile::Builder::new()
            .prefix(".styled_")
            .suffix(".docx")
            .tempfile_in(dir)?;

        let mut styles_seen = false;
        let mut document_seen = false;
        {
            let mut writer = ZipWriter::new(rewritten.as_file_mut());
            for index in 0..archive.len() {
                let mut entry = archive.by_index(index)?;
                let name = entry.name().to_owned();
                let options = SimpleFileOptions::default().compression_method(entry.compression());

                if entry.is_dir() {
                    writer.add_directory(name, options)?;
                    continue;
                }

                let mut data = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
                entry.read_to_end(&mut data)?;
                let data = match name.as_str() {
                    STYLES_PART => {
                        styles_seen = true;
                        self.rewrite_styles(&String::from_utf8_lossy(&data))?
                    }
                    DOCUMENT_PART => {
                        document_seen = true;
                        self.rewrite_margins(&String::from_utf8_lossy(&data))?
                    }
                    _ => data,
                };

                writer.start_file(name, options)?;
                writer.write_all(&data)?;
            }
            writer.finish()?;
        }

        if !styles_seen {
            return Err(StyleError::MissingPart(STYLES_PART));
        }
        if !document_seen {
            return Err(StyleError::MissingPart(DOCUMENT_PART));
        }

        rewritten.persist(path).map_err(|e| StyleError::Io(e.error))?;
        tracing::debug!(path = %path.display(), "Applied document styles");
        Ok(())
    }

    /// Rewrite the `Normal` paragraph style in a styles part.
    fn rewrite_styles(&self, xml: &str) -> Result<Vec<u8>, StyleError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Vec::with_capacity(xml.len() + 512));
        let mut style: Option<Vec<Event<'static>>> = None;
        let mut normal_found = false;

        loop {
            let event = reader.read_event()?;
            if matches!(event, Event::Eof) {
                break;
            }

            if let Some(buffer) = style.as_mut() {
                let closes = is_end(&event, STYLE);
                buffer.push(event.into_owned());
                if closes {
                    let buffered = style.take().unwrap_or_default();
                    let buffered = if is_normal_style(&buffered)? {
                        normal_found = true;
                        self.restyle_normal(buffered)
                    } else {
                        buffered
                    };
                    write_events(&mut writer, buffered)?;
                }
                continue;
            }

            if is_start(&event, STYLE) {
                style = Some(vec![event.into_owned()]);
            } else if is_end(&event, STYLES) && !normal_found {
                write_events(&mut writer, self.restyle_normal(new_normal_style()))?;
                writer.write_event(event)?;
            } else {
                writer.write_event(event)?;
            }
        }

        Ok(writer.into_inner())
    }

    /// Replace the paragraph and run properties of a buffered `Normal` style.
    fn restyle_normal(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let last = events.len().saturating_sub(1);
        let mut out = Vec::with_capacity(events.len() + 8);
        let mut depth = 0usize;
        // depth at which the skipped property element closes
        let mut skip: Option<usize> = None;

        for (index, event) in events.into_iter().enumerate() {
            if index == last {
                out.extend(self.normal_properties());
                out.push(event);
                break;
            }

            match &event {
                Event::Start(e) => {
                    if skip.is_none() && depth == 1 && is_run_or_paragraph_props(e) {
                        skip = Some(depth);
                    }
                    depth += 1;
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if skip == Some(depth) {
                        skip = None;
                        continue;
                    }
                }
                Event::Empty(e) if skip.is_none() && depth == 1 && is_run_or_paragraph_props(e) => {
                    continue;
                }
                _ => {}
            }

            if skip.is_none() {
                out.push(event);
            }
        }

        out
    }

    fn normal_properties(&self) -> Vec<Event<'static>> {
        let line = self.line_spacing.to_string();
        let size = self.font_size.to_string();

        let mut spacing = BytesStart::new("w:spacing");
        spacing.push_attribute(("w:line", line.as_str()));
        spacing.push_attribute(("w:lineRule", "auto"));

        let mut fonts = BytesStart::new("w:rFonts");
        for key in ["w:ascii", "w:hAnsi", "w:eastAsia", "w:cs"] {
            fonts.push_attribute((key, self.font.as_str()));
        }

        let mut sz = BytesStart::new("w:sz");
        sz.push_attribute(("w:val", size.as_str()));
        let mut sz_cs = BytesStart::new("w:szCs");
        sz_cs.push_attribute(("w:val", size.as_str()));

        vec![
            Event::Start(BytesStart::new("w:pPr")),
            Event::Empty(spacing),
            Event::End(BytesEnd::new("w:pPr")),
            Event::Start(BytesStart::new("w:rPr")),
            Event::Empty(fonts),
            Event::Empty(sz),
            Event::Empty(sz_cs),
            Event::End(BytesEnd::new("w:rPr")),
        ]
    }

    /// Set the page margins of every section in a document part.
    fn rewrite_margins(&self, xml: &str) -> Result<Vec<u8>, StyleError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Vec::with_capacity(xml.len() + 256));
        let mut section: Option<Vec<Event<'static>>> = None;

        loop {
            let event = reader.read_event()?;
            if matches!(event, Event::Eof) {
                break;
            }

            if let Some(buffer) = section.as_mut() {
                let closes = is_end(&event, SECT_PR);
                buffer.push(event.into_owned());
                if closes {
                    let buffered = section.take().unwrap_or_default();
                    write_events(&mut writer, self.apply_margins(buffered)?)?;
                }
                continue;
            }

            if is_start(&event, SECT_PR) {
                section = Some(vec![event.into_owned()]);
            } else if let Event::Empty(e) = &event
                && e.name().as_ref() == SECT_PR
            {
                let start = e.clone().into_owned();
                let end = BytesEnd::new("w:sectPr");
                let expanded = vec![Event::Start(start), Event::End(end)];
                write_events(&mut writer, self.apply_margins(expanded)?)?;
            } else {
                writer.write_event(event)?;
            }
        }

        Ok(writer.into_inner())
    }

    /// Rewrite or insert `w:pgMar` in a buffered `w:sectPr`.
    fn apply_margins(&self, mut events: Vec<Event<'static>>) -> Result<Vec<Event<'static>>, StyleError> {
        let mut depth = 0usize;
        let mut found = false;
        let mut after_pg_sz = None;
        let mut after_preceding = 1;

        for index in 0..events.len() {
            let replacement = match &events[index] {
                Event::Start(e) => {
                    depth += 1;
                    (depth == 2 && e.name().as_ref() == PG_MAR.as_bytes())
                        .then(|| self.margin_element(Some(e)).map(Event::Start))
                }
                Event::Empty(e) if depth == 1 => {
                    let name = e.name();
                    if name.as_ref() == PG_SZ {
                        after_pg_sz = Some(index + 1);
                    } else if BEFORE_PG_MAR.contains(&name.as_ref()) {
                        after_preceding = index + 1;
                    }
                    (name.as_ref() == PG_MAR.as_bytes())
                        .then(|| self.margin_element(Some(e)).map(Event::Empty))
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        let name = e.name();
                        if name.as_ref() == PG_SZ {
                            after_pg_sz = Some(index + 1);
                        } else if BEFORE_PG_MAR.contains(&name.as_ref()) {
                            after_preceding = index + 1;
                        }
                    }
                    None
                }
                _ => None,
            };

            if let Some(replacement) = replacement {
                events[index] = replacement?;
                found = true;
            }
        }

        if !found {
            let at = after_pg_sz.unwrap_or(after_preceding).min(events.len());
            events.insert(at, Event::Empty(self.margin_element(None)?));
        }

        Ok(events)
    }

    /// Build a `w:pgMar` element, keeping non-margin attributes of `existing`.
    fn margin_element(&self, existing: Option<&BytesStart<'_>>) -> Result<BytesStart<'static>, StyleError> {
        let m = self.margins;
        let values = [m.top, m.right, m.bottom, m.left].map(|v| v.to_string());

        let mut element = BytesStart::new(PG_MAR);
        for (key, value) in MARGIN_KEYS.iter().zip(&values) {
            element.push_attribute((*key, value.as_bytes()));
        }

        match existing {
            Some(existing) => {
                for attr in existing.attributes() {
                    let attr = attr?;
                    if !MARGIN_KEYS.contains(&attr.key.as_ref()) {
                        element.push_attribute(attr);
                    }
                }
            }
            None => {
                for (key, value) in [("w:header", "720"), ("w:footer", "720"), ("w:gutter", "0")] {
                    element.push_attribute((key, value));
                }
            }
        }

        Ok(element)
    }
}

fn is_start(event: &Event<'_>, name: &[u8]) -> bool {
    matches!(event, Event::Start(e) if e.name().as_ref() == name)
}

fn is_end(event: &Event<'_>, name: &[u8]) -> bool {
    matches!(event, Event::End(e) if e.name().as_ref() == name)
}

fn is_run_or_paragraph_props(e: &BytesStart<'_>) -> bool {
    matches!(e.name().as_ref(), b"w:pPr" | b"w:rPr")
}

/// Whether a buffered `w:style` is the `Normal` paragraph style.
fn is_normal_style(events: &[Event<'static>]) -> Result<bool, StyleError> {
    let Some(Event::Start(start)) = events.first() else {
        return Ok(false);
    };
    let is_paragraph = start
        .try_get_attribute("w:type")?
        .is_some_and(|a| a.value.as_ref() == b"paragraph");
    let is_normal = start
        .try_get_attribute("w:styleId")?
        .is_some_and(|a| a.value.as_ref() == b"Normal");
    Ok(is_paragraph && is_normal)
}

fn new_normal_style() -> Vec<Event<'static>> {
    let mut start = BytesStart::new("w:style");
    start.push_attribute(("w:type", "paragraph"));
    start.push_attribute(("w:default", "1"));
    start.push_attribute(("w:styleId", "Normal"));
    let mut name = BytesStart::new("w:name");
    name.push_attribute(("w:val", "Normal"));

    vec![
        Event::Start(start),
        Event::Empty(name),
        Event::Empty(BytesStart::new("w:qFormat")),
        Event::End(BytesEnd::new("w:style")),
    ]
}

fn write_events(writer: &mut Writer<Vec<u8>>, events: Vec<Event<'static>>) -> Result<(), StyleError> {
    for event in events {
        writer.write_event(event)?;
    }
    Ok(())
}
