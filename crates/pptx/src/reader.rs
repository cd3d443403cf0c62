//! PPTX deck reader, used to inspect generated decks.

use course_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

/// Text content of one slide read back from a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeckSlide {
    /// 1-based position in the deck.
    pub number: usize,

    /// Text of the title placeholder, if any.
    pub title: Option<String>,

    /// Paragraphs of every other text shape, top to bottom.
    pub lines: Vec<String>,

    /// Speaker notes, if the slide has a notes page with text.
    pub notes: Option<String>,

    /// Number of pictures on the slide.
    pub pictures: usize,
}

/// Reader for PPTX (Office Open XML) decks.
#[derive(Debug, Default, Clone)]
pub struct PptxReader;

impl PptxReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a deck from disk.
    pub fn read_file(&self, path: &Path) -> Result<Vec<DeckSlide>> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Read a deck from any seekable reader.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<Vec<DeckSlide>> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let slide_paths = self.slide_order(&mut archive)?;
        let mut slides = Vec::with_capacity(slide_paths.len());

        for (idx, path) in slide_paths.iter().enumerate() {
            slides.push(self.read_slide(&mut archive, path, idx + 1)?);
        }

        log::debug!("Read {} slides", slides.len());
        Ok(slides)
    }

    /// Slide part paths in presentation order.
    ///
    /// The order comes from `p:sldIdLst`; when that cannot be used, slides
    /// are sorted by the number in their relationship id or file name.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_rels(&read_part(archive, "ppt/_rels/presentation.xml.rels")?)?;
        let slide_rels: HashMap<&str, &Relationship> = rels
            .iter()
            .filter(|r| is_rel_type(&r.kind, "slide"))
            .map(|r| (r.id.as_str(), r))
            .collect();

        if let Ok(presentation) = read_part(archive, "ppt/presentation.xml") {
            let ids = slide_id_list(&presentation)?;
            let ordered: Option<Vec<String>> = ids
                .iter()
                .map(|id| slide_rels.get(id.as_str()).map(|r| resolve_target("ppt", &r.target)))
                .collect();
            match ordered {
                Some(paths) if !paths.is_empty() || slide_rels.is_empty() => return Ok(paths),
                _ => log::warn!("Slide list does not match relationships, ordering by number"),
            }
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .values()
            .map(|r| {
                let order = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
                (resolve_target("ppt", &r.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        number: usize,
    ) -> Result<DeckSlide> {
        let content = read_part(archive, slide_path)?;
        let shapes = extract_shapes(&content);

        let mut slide = DeckSlide {
            number,
            pictures: count_pictures(&content),
            ..Default::default()
        };

        for shape in shapes {
            if slide.title.is_none() && shape.is_title() {
                slide.title = Some(shape.paragraphs.join(" "));
            } else {
                slide.lines.extend(shape.paragraphs);
            }
        }

        slide.notes = self.read_notes(archive, slide_path);
        Ok(slide)
    }

    /// Body text of the slide's notes page. Missing notes are not an error.
    fn read_notes<R: Read + Seek>(&self, archive: &mut ZipArchive<R>, slide_path: &str) -> Option<String> {
        let (dir, file) = slide_path.rsplit_once('/')?;
        let rels_path = format!("{}/_rels/{}.rels", dir, file);
        let rels = read_rels(&read_part(archive, &rels_path).ok()?).ok()?;
        let notes_rel = rels.iter().find(|r| is_rel_type(&r.kind, "notesSlide"))?;

        let notes_path = resolve_target(dir, &notes_rel.target);
        let content = match read_part(archive, &notes_path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Could not read notes for {}: {}", slide_path, e);
                return None;
            }
        };

        let text = extract_shapes(&content)
            .into_iter()
            .filter(|s| s.placeholder.as_deref() == Some("body"))
            .flat_map(|s| s.paragraphs)
            .collect::<Vec<_>>()
            .join("\n");

        (!text.is_empty()).then_some(text)
    }
}

/// A relationship read from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

fn is_rel_type(kind: &str, name: &str) -> bool {
    kind.rsplit('/').next() == Some(name)
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

fn read_rels(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                rels.push(Relationship {
                    id: attr_value(e, b"Id").unwrap_or_default(),
                    kind: attr_value(e, b"Type").unwrap_or_default(),
                    target: attr_value(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing relationships: {}", e))),
            _ => {}
        }
    }

    Ok(rels)
}

/// Relationship ids of `p:sldId` entries, in order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = attr_value(e, b"r:id") {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing presentation: {}", e))),
            _ => {}
        }
    }

    Ok(ids)
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut parts: Vec<&str> = base_dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            ".." => {
                parts.pop();
            }
            "." | "" => {}
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// A text shape.
#[derive(Debug, Default)]
struct ShapeInfo {
    placeholder: Option<String>,
    paragraphs: Vec<String>,
}

impl ShapeInfo {
    fn is_title(&self) -> bool {
        matches!(self.placeholder.as_deref(), Some("title") | Some("ctrTitle"))
    }
}

/// Text shapes of a slide or notes part, in document order.
fn extract_shapes(xml: &str) -> Vec<ShapeInfo> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut current: Option<ShapeInfo> = None;
    let mut paragraph: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => current = Some(ShapeInfo::default()),
                b"p" if current.is_some() => paragraph = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if local_name(e.name().as_ref()) == b"ph" {
                    if let Some(shape) = current.as_mut() {
                        shape.placeholder = Some(attr_value(e, b"type").unwrap_or_else(|| "body".to_string()));
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(text) = paragraph.as_mut() {
                    text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"p" => {
                    if let (Some(text), Some(shape)) = (paragraph.take(), current.as_mut()) {
                        let text = text.trim();
                        if !text.is_empty() {
                            shape.paragraphs.push(text.to_string());
                        }
                    }
                }
                b"sp" => {
                    if let Some(shape) = current.take() {
                        if !shape.paragraphs.is_empty() {
                            shapes.push(shape);
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error (continuing): {}", e);
            }
            _ => {}
        }
    }

    shapes
}

fn count_pictures(xml: &str) -> usize {
    let mut reader = Reader::from_str(xml);
    let mut count = 0;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"pic" => count += 1,
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    count
}

/// Read a part from the ZIP archive.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");
    let start = s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    s[start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::PptxDeckWriter;
    use course_core::coordinator::SlideArtifacts;
    use course_core::{parse, DeckWriter, RenderAssembler, SlideProjector};
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    const OUTLINE: &str = "AI 101
1. Security & Trust
1.1 Basics
1.1.1 Intro
1.1.1.1 Point A
1.1.1.2 Point <B>";

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("ppt", "slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(
            resolve_target("ppt/slides", "../notesSlides/notesSlide2.xml"),
            "ppt/notesSlides/notesSlide2.xml"
        );
        assert_eq!(resolve_target("ppt", "/ppt/slides/slide1.xml"), "ppt/slides/slide1.xml");
    }

    #[test]
    fn test_written_deck_reads_back() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("03_slide.png");
        fs::write(&image, b"\x89PNG\r\n\x1a\n").unwrap();

        let slides = SlideProjector::new(10).project(&parse(OUTLINE).unwrap());
        let mut artifacts = SlideArtifacts::default();
        artifacts
            .images
            .insert(slides[2].id.clone(), slides[2].title.clone(), image);
        artifacts.notes = [("Intro", "First line\nSecond line"), ("x", "y")]
            .into_iter()
            .collect();

        let plan = RenderAssembler::new(dir.path()).plan("AI 101", &slides, &artifacts);
        let path = dir.path().join("deck.pptx");
        PptxDeckWriter::new().write_deck(&plan, &path).unwrap();

        let read = PptxReader::new().read_file(&path).unwrap();
        assert_eq!(read.len(), 4);

        assert_eq!(read[0].title.as_deref(), Some("AI 101"));
        assert!(read[0].lines.is_empty());
        assert!(read[0]
            .notes
            .as_deref()
            .unwrap()
            .starts_with("Welcome to the course: AI 101."));

        assert_eq!(read[1].title.as_deref(), Some("Module 1: Security & Trust"));
        assert_eq!(read[1].lines, vec!["Basics"]);
        assert_eq!(read[2].title.as_deref(), Some("1.1: Basics"));

        assert_eq!(read[3].number, 4);
        assert_eq!(read[3].title.as_deref(), Some("Intro"));
        assert_eq!(read[3].lines, vec!["Point A", "Point <B>"]);
        assert_eq!(read[3].notes.as_deref(), Some("First line\nSecond line"));
        assert_eq!(read[3].pictures, 1);
        assert_eq!(read[1].pictures, 0);
    }

    #[test]
    fn test_empty_deck() {
        let plan = course_core::DeckPlan {
            course_title: "Empty".to_string(),
            slides: Vec::new(),
        };
        let mut buffer = Cursor::new(Vec::new());
        PptxDeckWriter::new().write_to(&plan, &mut buffer).unwrap();

        buffer.set_position(0);
        assert!(PptxReader::new().read(buffer).unwrap().is_empty());
    }

    #[test]
    fn test_not_a_zip() {
        let err = PptxReader::new().read(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }
}
