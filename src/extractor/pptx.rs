use crate::error::{IngestError, Result};
use crate::extractor::r#trait::TextExtractor;
use crate::utils;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::result::ZipError;
use zip::ZipArchive;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";
const SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Slide deck extractor (pptx, and ppt by extension)
///
/// Slides are visited in presentation order. Each becomes a `Slide N:`
/// header followed by the text of every shape that has any, one shape per
/// line. Slides are separated by a blank line.
pub struct SlideDeckExtractor;

impl SlideDeckExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_blocking(path: &Path) -> std::result::Result<String, BoxError> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let mut slides = Vec::new();
        for (index, part) in slide_parts(&mut archive)?.into_iter().enumerate() {
            let xml = read_part(&mut archive, &part)?;
            let mut lines = vec![format!("Slide {}:", index + 1)];
            lines.extend(shape_texts(&xml)?.into_iter().filter(|text| !text.is_empty()));
            slides.push(lines.join("\n"));
        }

        Ok(slides.join("\n\n"))
    }
}

impl Default for SlideDeckExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn read_part(archive: &mut ZipArchive<File>, name: &str) -> std::result::Result<String, BoxError> {
    let mut part = archive.by_name(name)?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)?;
    Ok(xml)
}

/// Like `read_part`, but a missing part is `None` rather than an error
fn read_optional_part(
    archive: &mut ZipArchive<File>,
    name: &str,
) -> std::result::Result<Option<String>, BoxError> {
    match archive.by_name(name) {
        Ok(mut part) => {
            let mut xml = String::new();
            part.read_to_string(&mut xml)?;
            Ok(Some(xml))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Slide part names in presentation order
///
/// The order comes from `p:sldIdLst` in the presentation part, resolved
/// through its relationships. Archives without those parts fall back to
/// the slide number in the part name.
fn slide_parts(archive: &mut ZipArchive<File>) -> std::result::Result<Vec<String>, BoxError> {
    let presentation = read_optional_part(archive, PRESENTATION_PART)?;
    let rels = read_optional_part(archive, PRESENTATION_RELS_PART)?;

    match (presentation, rels) {
        (Some(presentation), Some(rels)) => {
            let targets = relationship_targets(&rels)?;
            let parts = slide_ids(&presentation)?
                .into_iter()
                .filter_map(|id| targets.get(&id))
                .map(|target| resolve_target(target))
                .filter(|part| archive.file_names().any(|name| name == part))
                .collect();
            Ok(parts)
        }
        _ => Ok(numbered_slide_parts(archive)),
    }
}

fn numbered_slide_parts(archive: &ZipArchive<File>) -> Vec<String> {
    let mut parts: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name.strip_prefix(SLIDE_PREFIX)?.strip_suffix(".xml")?;
            number.parse().ok().map(|n| (n, name.to_string()))
        })
        .collect();
    parts.sort();
    parts.into_iter().map(|(_, name)| name).collect()
}

fn attribute(element: &BytesStart<'_>, name: &str) -> std::result::Result<Option<String>, BoxError> {
    Ok(match element.try_get_attribute(name)? {
        Some(attr) => Some(attr.unescape_value()?.into_owned()),
        None => None,
    })
}

/// Relationship ids of `p:sldId` entries, in list order
fn slide_ids(presentation_xml: &str) -> std::result::Result<Vec<String>, BoxError> {
    let mut reader = Reader::from_str(presentation_xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldId" => {
                if let Some(id) = attribute(&e, "r:id")? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

/// Relationship id to target, as written in a `.rels` part
fn relationship_targets(rels_xml: &str) -> std::result::Result<HashMap<String, String>, BoxError> {
    let mut reader = Reader::from_str(rels_xml);
    let mut targets = HashMap::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) = (attribute(&e, "Id")?, attribute(&e, "Target")?) {
                    targets.insert(id, target);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(targets)
}

/// Archive part name for a target relative to `ppt/presentation.xml`
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target.trim_start_matches("./")),
    }
}

/// Paragraphs of the shape currently being read
#[derive(Default)]
struct ShapeText {
    paragraphs: Vec<String>,
    current: Option<String>,
    in_run_text: bool,
}

impl ShapeText {
    fn push_str(&mut self, text: &str) {
        if let Some(current) = self.current.as_mut() {
            current.push_str(text);
        }
    }

    fn finish(self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Text of each shape on a slide, paragraphs joined by newlines
fn shape_texts(xml: &str) -> std::result::Result<Vec<String>, BoxError> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();
    let mut shape: Option<ShapeText> = None;

    loop {
        let event = reader.read_event()?;
        if let Event::Eof = event {
            break;
        }

        match event {
            Event::Start(e) if e.name().as_ref() == b"p:sp" => shape = Some(ShapeText::default()),
            Event::End(e) if e.name().as_ref() == b"p:sp" => {
                if let Some(done) = shape.take() {
                    shapes.push(done.finish());
                }
            }
            event => {
                let Some(current) = shape.as_mut() else {
                    continue;
                };
                match event {
                    Event::Start(e) => match e.name().as_ref() {
                        b"a:p" => current.current = Some(String::new()),
                        b"a:t" => current.in_run_text = true,
                        _ => {}
                    },
                    Event::End(e) => match e.name().as_ref() {
                        b"a:p" => {
                            if let Some(paragraph) = current.current.take() {
                                current.paragraphs.push(paragraph);
                            }
                        }
                        b"a:t" => current.in_run_text = false,
                        _ => {}
                    },
                    Event::Empty(e) => match e.name().as_ref() {
                        b"a:p" => current.paragraphs.push(String::new()),
                        b"a:br" => current.push_str("\n"),
                        _ => {}
                    },
                    Event::Text(t) if current.in_run_text => current.push_str(&t.unescape()?),
                    Event::CData(c) if current.in_run_text => {
                        current.push_str(&String::from_utf8_lossy(&c.into_inner()))
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(shapes)
}

#[async_trait::async_trait]
impl TextExtractor for SlideDeckExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let format = utils::get_extension(path).unwrap_or_else(|| "pptx".to_string());
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::extract_blocking(&owned))
            .await
            .map_err(|e| IngestError::extraction(path, &format, e))?
            .map_err(|e| IngestError::extraction(path, &format, e))
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "pptx" | "ppt")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Write a zip archive holding the given (name, contents) parts
    pub(crate) fn write_archive(path: &Path, parts: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in parts {
            zip.start_file(*name, FileOptions::default()).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", p))
            .collect();
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"2\" name=\"Title\"/></p:nvSpPr><p:txBody><a:bodyPr/>{}</p:txBody></p:sp>",
            body
        )
    }

    /// Slide XML with one shape per entry; each entry lists that shape's paragraphs
    pub(crate) fn slide_xml(shapes: &[&[&str]]) -> String {
        let body: String = shapes.iter().map(|s| shape(s)).collect();
        format!("<p:sld><p:cSld><p:spTree>{}<p:pic/></p:spTree></p:cSld></p:sld>", body)
    }

    /// Presentation and relationship parts listing `slide_files` in that order
    fn presentation_parts(slide_files: &[&str]) -> (String, String) {
        let ids: String = (0..slide_files.len())
            .map(|i| format!("<p:sldId id=\"{}\" r:id=\"rId{}\"/>", 256 + i, i + 10))
            .collect();
        let rels: String = slide_files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                format!(
                    "<Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/{}\"/>",
                    i + 10,
                    file
                )
            })
            .collect();
        (
            format!("<p:presentation><p:sldIdLst>{}</p:sldIdLst></p:presentation>", ids),
            format!("<Relationships>{}</Relationships>", rels),
        )
    }

    pub(crate) fn write_test_pptx(path: &Path, slides: &[&[&[&str]]]) {
        let files: Vec<String> = (1..=slides.len()).map(|n| format!("slide{}.xml", n)).collect();
        let file_refs: Vec<&str> = files.iter().map(String::as_str).collect();
        let (presentation, rels) = presentation_parts(&file_refs);

        let xmls: Vec<(String, String)> = slides
            .iter()
            .zip(&files)
            .map(|(shapes, file)| (format!("ppt/slides/{}", file), slide_xml(shapes)))
            .collect();
        let mut parts: Vec<(&str, &str)> = vec![
            ("[Content_Types].xml", "<Types/>"),
            (PRESENTATION_PART, presentation.as_str()),
            (PRESENTATION_RELS_PART, rels.as_str()),
        ];
        parts.extend(xmls.iter().map(|(n, x)| (n.as_str(), x.as_str())));
        write_archive(path, &parts);
    }

    #[tokio::test]
    async fn test_slides_with_headers() {
        let temp_file = NamedTempFile::new().unwrap();
        write_test_pptx(
            temp_file.path(),
            &[
                &[&["Newton's laws"], &["Inertia", "F = ma"]],
                &[&[""], &["Action and reaction"]],
            ],
        );

        let text = SlideDeckExtractor::new().extract(temp_file.path()).await.unwrap();
        assert_eq!(
            text,
            "Slide 1:\nNewton's laws\nInertia\nF = ma\n\nSlide 2:\nAction and reaction"
        );
    }

    #[tokio::test]
    async fn test_slides_follow_presentation_order() {
        let temp_file = NamedTempFile::new().unwrap();
        let (presentation, rels) = presentation_parts(&["slide2.xml", "slide1.xml"]);
        let slide1 = slide_xml(&[&["Intro"]]);
        let slide2 = slide_xml(&[&["Moved to front"]]);
        write_archive(
            temp_file.path(),
            &[
                (PRESENTATION_PART, presentation.as_str()),
                (PRESENTATION_RELS_PART, rels.as_str()),
                ("ppt/slides/slide1.xml", slide1.as_str()),
                ("ppt/slides/slide2.xml", slide2.as_str()),
            ],
        );

        let text = SlideDeckExtractor::new().extract(temp_file.path()).await.unwrap();
        assert_eq!(text, "Slide 1:\nMoved to front\n\nSlide 2:\nIntro");
    }

    #[tokio::test]
    async fn test_slides_numeric_order_without_presentation_part() {
        let temp_file = NamedTempFile::new().unwrap();
        let slide2 = slide_xml(&[&["second"]]);
        let slide10 = slide_xml(&[&["tenth"]]);
        let slide1 = slide_xml(&[&["first"]]);
        write_archive(
            temp_file.path(),
            &[
                ("ppt/slides/slide10.xml", slide10.as_str()),
                ("ppt/slides/slide2.xml", slide2.as_str()),
                ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
                ("ppt/slides/slide1.xml", slide1.as_str()),
            ],
        );

        let text = SlideDeckExtractor::new().extract(temp_file.path()).await.unwrap();
        assert_eq!(
            text,
            "Slide 1:\nfirst\n\nSlide 2:\nsecond\n\nSlide 3:\ntenth"
        );
    }

    #[tokio::test]
    async fn test_slide_deck_malformed() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), b"not a presentation").unwrap();

        let result = SlideDeckExtractor::new().extract(temp_file.path()).await;
        assert!(matches!(result, Err(IngestError::Extraction { .. })));
    }

    #[test]
    fn test_shape_texts_skip_non_text_shapes() {
        let xml = "<p:spTree><p:sp><p:spPr/></p:sp><p:sp><p:txBody><a:p><a:r><a:t>Hi</a:t></a:r><a:br/><a:r><a:t>there</a:t></a:r></a:p></p:txBody></p:sp></p:spTree>";
        assert_eq!(shape_texts(xml).unwrap(), vec!["".to_string(), "Hi\nthere".to_string()]);
    }

    #[test]
    fn test_shape_texts_entities_and_cdata() {
        let xml = "<p:sp><p:txBody><a:p><a:r><a:t>R&amp;D &#233;tude</a:t></a:r></a:p>\
                   <a:p><a:r><a:t><![CDATA[Cdata <text>]]></a:t></a:r></a:p><a:p/></p:txBody></p:sp>";
        assert_eq!(shape_texts(xml).unwrap(), vec!["R&D étude\nCdata <text>\n".to_string()]);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide3.xml"), "ppt/slides/slide3.xml");
        assert_eq!(resolve_target("/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
    }
}
