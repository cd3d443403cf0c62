//! PPTX deck writer.
//!
//! Produces a minimal Office Open XML package: one blank master and layout,
//! one slide per [`RenderedSlide`] with its title, bullets and image, and a
//! notes page carrying the speaker notes.

use crate::parts::*;
use course_core::{DeckPlan, DeckWriter, Error, RenderedSlide, Result, SlideLevel};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Slide width in EMU (16:9).
const SLIDE_CX: i64 = 12_192_000;

/// Slide height in EMU.
const SLIDE_CY: i64 = 6_858_000;

const MARGIN: i64 = 457_200;

/// A rectangle in EMU.
#[derive(Debug, Clone, Copy)]
struct Frame {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

const CONTENT_TITLE: Frame = Frame {
    x: MARGIN,
    y: 274_320,
    cx: SLIDE_CX - 2 * MARGIN,
    cy: 1_143_000,
};

const BODY_FULL: Frame = Frame {
    x: MARGIN,
    y: 1_600_200,
    cx: SLIDE_CX - 2 * MARGIN,
    cy: 4_800_600,
};

const BODY_LEFT: Frame = Frame {
    x: MARGIN,
    y: 1_600_200,
    cx: 5_486_400,
    cy: 4_800_600,
};

const PICTURE_RIGHT: Frame = Frame {
    x: 6_248_400,
    y: 1_600_200,
    cx: 5_486_400,
    cy: 4_800_600,
};

const COURSE_TITLE: Frame = Frame {
    x: 914_400,
    y: 1_600_200,
    cx: SLIDE_CX - 2 * 914_400,
    cy: 1_470_025,
};

const COURSE_PICTURE: Frame = Frame {
    x: 4_114_800,
    y: 3_429_000,
    cx: 3_962_400,
    cy: 2_971_800,
};

/// Title font size in hundredths of a point.
fn title_size(level: SlideLevel) -> &'static str {
    match level {
        SlideLevel::Title => "4400",
        SlideLevel::Module => "4000",
        SlideLevel::Topic => "3600",
        SlideLevel::Subtopic => "3200",
    }
}

fn xml_err(e: impl std::fmt::Display) -> Error {
    Error::XmlError(e.to_string())
}

fn zip_err(e: impl std::fmt::Display) -> Error {
    Error::ZipError(e.to_string())
}

/// Thin wrapper over a quick-xml writer building one part in memory.
struct XmlPart {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlPart {
    fn new() -> Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_err)?;
        Ok(Self { writer })
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(start)).map_err(xml_err)
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_err)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(start)).map_err(xml_err)
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_err)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }

    fn xfrm(&mut self, tag: &str, frame: Frame) -> Result<()> {
        let (x, y) = (frame.x.to_string(), frame.y.to_string());
        let (cx, cy) = (frame.cx.to_string(), frame.cy.to_string());
        self.open(tag, &[])?;
        self.empty("a:off", &[("x", x.as_str()), ("y", y.as_str())])?;
        self.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.close(tag)
    }

    fn sp_tree_header(&mut self) -> Result<()> {
        self.open("p:spTree", &[])?;
        self.open("p:nvGrpSpPr", &[])?;
        self.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
        self.empty("p:cNvGrpSpPr", &[])?;
        self.empty("p:nvPr", &[])?;
        self.close("p:nvGrpSpPr")?;
        self.empty("p:grpSpPr", &[])
    }

    /// Opening of a shape up to its text body.
    fn shape_start(&mut self, id: u32, name: &str, placeholder: Option<&str>, frame: Option<Frame>) -> Result<()> {
        let id = id.to_string();
        self.open("p:sp", &[])?;
        self.open("p:nvSpPr", &[])?;
        self.empty("p:cNvPr", &[("id", id.as_str()), ("name", name)])?;
        self.open("p:cNvSpPr", &[])?;
        self.empty("a:spLocks", &[("noGrp", "1")])?;
        self.close("p:cNvSpPr")?;
        match placeholder {
            Some(kind) => {
                self.open("p:nvPr", &[])?;
                self.empty("p:ph", &[("type", kind)])?;
                self.close("p:nvPr")?;
            }
            None => self.empty("p:nvPr", &[])?,
        }
        self.close("p:nvSpPr")?;
        match frame {
            Some(frame) => {
                self.open("p:spPr", &[])?;
                self.xfrm("a:xfrm", frame)?;
                self.open("a:prstGeom", &[("prst", "rect")])?;
                self.empty("a:avLst", &[])?;
                self.close("a:prstGeom")?;
                self.close("p:spPr")?;
            }
            None => self.empty("p:spPr", &[])?,
        }
        self.open("p:txBody", &[])?;
        self.empty("a:bodyPr", &[("wrap", "square")])?;
        self.empty("a:lstStyle", &[])
    }

    fn shape_end(&mut self) -> Result<()> {
        self.close("p:txBody")?;
        self.close("p:sp")
    }

    /// A paragraph with a single run.
    fn paragraph(&mut self, text: &str, run_props: &[(&str, &str)], color: Option<&str>, bullet: bool) -> Result<()> {
        self.open("a:p", &[])?;
        if bullet {
            self.open("a:pPr", &[("marL", "342900"), ("indent", "-342900")])?;
            self.empty("a:buFont", &[("typeface", "Arial")])?;
            self.empty("a:buChar", &[("char", "\u{2022}")])?;
            self.close("a:pPr")?;
        }
        self.open("a:r", &[])?;
        match color {
            Some(color) => {
                self.open("a:rPr", run_props)?;
                self.open("a:solidFill", &[])?;
                self.empty("a:srgbClr", &[("val", color)])?;
                self.close("a:solidFill")?;
                self.close("a:rPr")?;
            }
            None => self.empty("a:rPr", run_props)?,
        }
        self.open("a:t", &[])?;
        self.text(text)?;
        self.close("a:t")?;
        self.close("a:r")?;
        self.close("a:p")
    }

    fn picture(&mut self, id: u32, rel_id: &str, frame: Frame) -> Result<()> {
        let id = id.to_string();
        self.open("p:pic", &[])?;
        self.open("p:nvPicPr", &[])?;
        self.empty("p:cNvPr", &[("id", id.as_str()), ("name", "Slide Image")])?;
        self.open("p:cNvPicPr", &[])?;
        self.empty("a:picLocks", &[("noChangeAspect", "1")])?;
        self.close("p:cNvPicPr")?;
        self.empty("p:nvPr", &[])?;
        self.close("p:nvPicPr")?;
        self.open("p:blipFill", &[])?;
        self.empty("a:blip", &[("r:embed", rel_id)])?;
        self.open("a:stretch", &[])?;
        self.empty("a:fillRect", &[])?;
        self.close("a:stretch")?;
        self.close("p:blipFill")?;
        self.open("p:spPr", &[])?;
        self.xfrm("a:xfrm", frame)?;
        self.open("a:prstGeom", &[("prst", "rect")])?;
        self.empty("a:avLst", &[])?;
        self.close("a:prstGeom")?;
        self.close("p:spPr")?;
        self.close("p:pic")
    }
}

/// A relationship entry.
struct Rel {
    id: String,
    kind: &'static str,
    target: String,
}

impl Rel {
    fn new(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            target: target.into(),
        }
    }
}

fn rels_xml(rels: &[Rel]) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.open("Relationships", &[("xmlns", NS_RELS)])?;
    for rel in rels {
        let kind = format!("{}/{}", REL_BASE, rel.kind);
        xml.empty(
            "Relationship",
            &[
                ("Id", rel.id.as_str()),
                ("Type", kind.as_str()),
                ("Target", rel.target.as_str()),
            ],
        )?;
    }
    xml.close("Relationships")?;
    Ok(xml.finish())
}

/// Image file extension and content type for a picture path.
fn image_format(path: &Path) -> (&'static str, &'static str) {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => ("jpeg", "image/jpeg"),
        "gif" => ("gif", "image/gif"),
        _ => ("png", "image/png"),
    }
}

/// Writes [`DeckPlan`]s as `.pptx` files.
#[derive(Debug, Default, Clone)]
pub struct PptxDeckWriter;

impl PptxDeckWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self
    }

    /// Write the deck as a PPTX package into `out`.
    pub fn write_to<W: Write + Seek>(&self, plan: &DeckPlan, out: W) -> Result<()> {
        let mut zip = ZipWriter::new(out);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let put = |zip: &mut ZipWriter<W>, name: &str, bytes: &[u8]| -> Result<()> {
            zip.start_file(name, options).map_err(zip_err)?;
            zip.write_all(bytes)?;
            Ok(())
        };

        let mut media_types: Vec<(&'static str, &'static str)> = Vec::new();
        let mut image_count = 0;

        for (i, slide) in plan.slides.iter().enumerate() {
            let number = i + 1;
            let mut rels = vec![Rel::new("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml")];

            let image_rel = match &slide.image {
                Some(path) => match fs::read(path) {
                    Ok(bytes) => {
                        image_count += 1;
                        let (ext, content_type) = image_format(path);
                        if !media_types.iter().any(|(e, _)| *e == ext) {
                            media_types.push((ext, content_type));
                        }
                        let media = format!("image{}.{}", image_count, ext);
                        put(&mut zip, &format!("ppt/media/{}", media), &bytes)?;
                        rels.push(Rel::new("rId2", "image", format!("../media/{}", media)));
                        Some("rId2")
                    }
                    Err(e) => {
                        log::warn!("Could not embed {}: {}", path.display(), e);
                        None
                    }
                },
                None => None,
            };

            rels.push(Rel::new(
                "rId3",
                "notesSlide",
                format!("../notesSlides/notesSlide{}.xml", number),
            ));

            put(&mut zip, &format!("ppt/slides/slide{}.xml", number), &slide_xml(slide, image_rel)?)?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                &rels_xml(&rels)?,
            )?;
            put(
                &mut zip,
                &format!("ppt/notesSlides/notesSlide{}.xml", number),
                &notes_xml(&slide.notes)?,
            )?;
            put(
                &mut zip,
                &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", number),
                &rels_xml(&[
                    Rel::new("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
                    Rel::new("rId2", "slide", format!("../slides/slide{}.xml", number)),
                ])?,
            )?;

            log::debug!("Wrote slide {}: {}", number, slide.title);
        }

        let count = plan.slides.len();
        put(&mut zip, "[Content_Types].xml", &content_types_xml(count, &media_types)?)?;
        put(&mut zip, "_rels/.rels", ROOT_RELS.as_bytes())?;
        put(&mut zip, "ppt/presentation.xml", &presentation_xml(count)?)?;
        put(&mut zip, "ppt/_rels/presentation.xml.rels", &presentation_rels_xml(count)?)?;
        put(&mut zip, "ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER.as_bytes())?;
        put(&mut zip, "ppt/slideMasters/_rels/slideMaster1.xml.rels", SLIDE_MASTER_RELS.as_bytes())?;
        put(&mut zip, "ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT.as_bytes())?;
        put(&mut zip, "ppt/slideLayouts/_rels/slideLayout1.xml.rels", SLIDE_LAYOUT_RELS.as_bytes())?;
        put(&mut zip, "ppt/notesMasters/notesMaster1.xml", NOTES_MASTER.as_bytes())?;
        put(&mut zip, "ppt/notesMasters/_rels/notesMaster1.xml.rels", NOTES_MASTER_RELS.as_bytes())?;
        put(&mut zip, "ppt/theme/theme1.xml", THEME.as_bytes())?;
        put(&mut zip, "ppt/theme/theme2.xml", THEME.as_bytes())?;

        let mut out = zip.finish().map_err(zip_err)?;
        out.flush()?;

        log::info!("Wrote {} slides with {} images", count, image_count);
        Ok(())
    }
}

impl DeckWriter for PptxDeckWriter {
    fn write_deck(&mut self, plan: &DeckPlan, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(plan, BufWriter::new(file))
    }
}

fn content_types_xml(slides: usize, media: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.open(
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    )?;
    xml.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    for (ext, content_type) in media {
        xml.empty("Default", &[("Extension", *ext), ("ContentType", *content_type)])?;
    }

    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_SLIDE_LAYOUT),
        ("/ppt/notesMasters/notesMaster1.xml".to_string(), CT_NOTES_MASTER),
        ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
        ("/ppt/theme/theme2.xml".to_string(), CT_THEME),
    ];
    for n in 1..=slides {
        overrides.push((format!("/ppt/slides/slide{}.xml", n), CT_SLIDE));
        overrides.push((format!("/ppt/notesSlides/notesSlide{}.xml", n), CT_NOTES_SLIDE));
    }
    for (part, content_type) in &overrides {
        xml.empty("Override", &[("PartName", part.as_str()), ("ContentType", *content_type)])?;
    }

    xml.close("Types")?;
    Ok(xml.finish())
}

fn presentation_xml(slides: usize) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.open("p:presentation", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)])?;

    xml.open("p:sldMasterIdLst", &[])?;
    xml.empty("p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    xml.close("p:sldMasterIdLst")?;

    xml.open("p:notesMasterIdLst", &[])?;
    xml.empty("p:notesMasterId", &[("r:id", "rId2")])?;
    xml.close("p:notesMasterIdLst")?;

    if slides > 0 {
        xml.open("p:sldIdLst", &[])?;
        for n in 0..slides {
            let id = (256 + n).to_string();
            let rel = format!("rId{}", n + 3);
            xml.empty("p:sldId", &[("id", id.as_str()), ("r:id", rel.as_str())])?;
        }
        xml.close("p:sldIdLst")?;
    }

    let (cx, cy) = (SLIDE_CX.to_string(), SLIDE_CY.to_string());
    xml.empty("p:sldSz", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    xml.empty("p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;
    xml.close("p:presentation")?;
    Ok(xml.finish())
}

fn presentation_rels_xml(slides: usize) -> Result<Vec<u8>> {
    let mut rels = vec![
        Rel::new("rId1", "slideMaster", "slideMasters/slideMaster1.xml"),
        Rel::new("rId2", "notesMaster", "notesMasters/notesMaster1.xml"),
    ];
    for n in 0..slides {
        rels.push(Rel::new(
            format!("rId{}", n + 3),
            "slide",
            format!("slides/slide{}.xml", n + 1),
        ));
    }
    rels.push(Rel::new(format!("rId{}", slides + 3), "theme", "theme/theme1.xml"));
    rels_xml(&rels)
}

fn slide_xml(slide: &RenderedSlide, image_rel: Option<&str>) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.open("p:sld", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)])?;
    xml.open("p:cSld", &[])?;
    xml.sp_tree_header()?;

    let is_title = slide.level == SlideLevel::Title;
    let color = slide.style.title_color();
    let size = title_size(slide.level);

    let (title_frame, placeholder) = if is_title {
        (COURSE_TITLE, "ctrTitle")
    } else {
        (CONTENT_TITLE, "title")
    };
    xml.shape_start(2, "Title 1", Some(placeholder), Some(title_frame))?;
    xml.paragraph(&slide.title, &[("lang", "en-US"), ("sz", size), ("b", "1")], Some(color), false)?;
    xml.shape_end()?;

    if !is_title && !slide.bullets.is_empty() {
        let body = if image_rel.is_some() { BODY_LEFT } else { BODY_FULL };
        xml.shape_start(3, "Content 2", Some("body"), Some(body))?;
        for bullet in &slide.bullets {
            xml.paragraph(bullet, &[("lang", "en-US"), ("sz", "2000")], None, true)?;
        }
        xml.shape_end()?;
    }

    if let Some(rel) = image_rel {
        let frame = if is_title { COURSE_PICTURE } else { PICTURE_RIGHT };
        xml.picture(4, rel, frame)?;
    }

    xml.close("p:spTree")?;
    xml.close("p:cSld")?;
    xml.open("p:clrMapOvr", &[])?;
    xml.empty("a:masterClrMapping", &[])?;
    xml.close("p:clrMapOvr")?;
    xml.close("p:sld")?;
    Ok(xml.finish())
}

fn notes_xml(notes: &str) -> Result<Vec<u8>> {
    let mut xml = XmlPart::new()?;
    xml.open("p:notes", &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)])?;
    xml.open("p:cSld", &[])?;
    xml.sp_tree_header()?;

    xml.shape_start(2, "Notes Placeholder 1", Some("body"), None)?;
    let mut wrote = false;
    for line in notes.lines().map(str::trim).filter(|l| !l.is_empty()) {
        xml.paragraph(line, &[("lang", "en-US")], None, false)?;
        wrote = true;
    }
    if !wrote {
        xml.empty("a:p", &[])?;
    }
    xml.shape_end()?;

    xml.close("p:spTree")?;
    xml.close("p:cSld")?;
    xml.close("p:notes")?;
    Ok(xml.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format() {
        assert_eq!(image_format(Path::new("a/01_slide.png")), ("png", "image/png"));
        assert_eq!(image_format(Path::new("a/01_slide.JPG")), ("jpeg", "image/jpeg"));
        assert_eq!(image_format(Path::new("a/noext")), ("png", "image/png"));
    }

    #[test]
    fn test_rels_xml() {
        let xml = rels_xml(&[Rel::new("rId1", "slide", "slides/slide1.xml")]).unwrap();
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>"#
        ));
    }

    #[test]
    fn test_notes_xml_escapes_text() {
        let xml = String::from_utf8(notes_xml("Tom & Jerry <3\n\nSecond").unwrap()).unwrap();
        assert!(xml.contains("<a:t>Tom &amp; Jerry &lt;3</a:t>"));
        assert!(xml.contains("<a:t>Second</a:t>"));
    }

    #[test]
    fn test_presentation_lists_slides() {
        let xml = String::from_utf8(presentation_xml(2).unwrap()).unwrap();
        assert!(xml.contains(r#"<p:sldId id="256" r:id="rId3"/>"#));
        assert!(xml.contains(r#"<p:sldId id="257" r:id="rId4"/>"#));
        let rels = String::from_utf8(presentation_rels_xml(2).unwrap()).unwrap();
        assert!(rels.contains(r#"Id="rId5""#));
        assert!(rels.contains("theme/theme1.xml"));
    }
}
