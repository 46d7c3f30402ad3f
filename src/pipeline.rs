use crate::compositor::{compose, CompositorConfig, LayoutReport};
use crate::error::{InputError, NewsletterError};
use crate::generate::{GenerationRequest, PromptImage, TextGenerator};
use crate::image::Image;
use crate::info::Info;
use crate::source::SourceDocument;
use std::path::Path;

/// An image supplied for the new issue. The first uploaded image goes on the
/// first page, the second on the second, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> UploadedImage {
        UploadedImage {
            name: name.into(),
            bytes,
        }
    }

    /// Read an image from disk, named after its file name
    pub fn read<P: AsRef<Path>>(path: P) -> Result<UploadedImage, std::io::Error> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedImage::new(name, std::fs::read(path)?))
    }
}

/// One newsletter issue on its way from the previous issue's PDF to the new
/// one. Stages run in order: load the source, generate the copy, optionally
/// edit it, then compose. Loading a new source throws away the copy and the
/// layout; changing the events, the images or the copy throws away the layout
/// only, so edited copy survives adding an image.
#[derive(Debug, Clone)]
pub struct NewsletterJob {
    pub publication: String,
    /// The issue's month, e.g. "October 2026"
    pub month: String,
    source: Option<SourceDocument>,
    events: String,
    images: Vec<UploadedImage>,
    generated_text: Option<String>,
    layout_bytes: Option<Vec<u8>>,
    report: Option<LayoutReport>,
}

impl NewsletterJob {
    pub fn new<P: Into<String>, M: Into<String>>(publication: P, month: M) -> NewsletterJob {
        NewsletterJob {
            publication: publication.into(),
            month: month.into(),
            source: None,
            events: String::new(),
            images: Vec::new(),
            generated_text: None,
            layout_bytes: None,
            report: None,
        }
    }

    /// Parse the previous issue and use it as this job's source
    pub fn load_source(&mut self, pdf: &[u8]) -> Result<&SourceDocument, NewsletterError> {
        let source = SourceDocument::from_bytes(pdf)?;
        self.generated_text = None;
        self.clear_layout();
        Ok(&*self.source.insert(source))
    }

    pub fn set_source(&mut self, source: SourceDocument) {
        self.source = Some(source);
        self.generated_text = None;
        self.clear_layout();
    }

    pub fn set_events<S: Into<String>>(&mut self, events: S) {
        self.events = events.into();
        self.clear_layout();
    }

    pub fn add_image(&mut self, image: UploadedImage) {
        self.images.push(image);
        self.clear_layout();
    }

    /// Replace the generated copy with an edited version
    pub fn set_generated_text<S: Into<String>>(&mut self, text: S) {
        self.generated_text = Some(text.into());
        self.clear_layout();
    }

    pub fn source(&self) -> Option<&SourceDocument> {
        self.source.as_ref()
    }

    pub fn events(&self) -> &str {
        &self.events
    }

    pub fn images(&self) -> &[UploadedImage] {
        &self.images
    }

    pub fn generated_text(&self) -> Option<&str> {
        self.generated_text.as_deref()
    }

    /// The finished PDF, once [NewsletterJob::compose] has run
    pub fn layout_bytes(&self) -> Option<&[u8]> {
        self.layout_bytes.as_deref()
    }

    pub fn report(&self) -> Option<&LayoutReport> {
        self.report.as_ref()
    }

    /// The request [NewsletterJob::generate] would send. Image and page counts
    /// are checked here so a job that could never be laid out is not sent to
    /// the generation service. Event details may be empty.
    pub fn generation_request(&self) -> Result<GenerationRequest, NewsletterError> {
        let source = self.source.as_ref().ok_or(InputError::MissingStage {
            stage: "generate",
            missing: "a source PDF",
        })?;
        if self.images.len() > source.pages.len() {
            return Err(InputError::TooManyImages {
                images: self.images.len(),
                pages: source.pages.len(),
            }
            .into());
        }

        let images = self
            .images
            .iter()
            .map(|image| {
                PromptImage::from_bytes(&image.bytes).inspect_err(|e| {
                    log::error!("uploaded image {} could not be read: {e}", image.name)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GenerationRequest {
            publication: self.publication.clone(),
            style_reference: source.text(),
            events: self.events.clone(),
            images,
            month: self.month.clone(),
        })
    }

    /// Draft the new issue's copy
    pub fn generate(&mut self, generator: &dyn TextGenerator) -> Result<&str, NewsletterError> {
        let request = self.generation_request()?;
        log::info!(
            "generating the {} issue from {} characters of reference text and {} images",
            request.month,
            request.style_reference.len(),
            request.images.len()
        );
        let text = generator.generate(&request)?;
        log::info!("generated {} characters of newsletter copy", text.len());

        self.clear_layout();
        Ok(self.generated_text.insert(text).as_str())
    }

    /// Lay the generated copy out on the source's page sizes and render the PDF.
    /// Without [CompositorConfig::info], the document is titled after the issue.
    pub fn compose(&mut self, config: &CompositorConfig) -> Result<&LayoutReport, NewsletterError> {
        let source = self.source.as_ref().ok_or(InputError::MissingStage {
            stage: "compose",
            missing: "a source PDF",
        })?;
        let text = self
            .generated_text
            .as_deref()
            .ok_or(InputError::MissingStage {
                stage: "compose",
                missing: "generated text",
            })?;

        let images = self
            .images
            .iter()
            .map(|image| {
                Image::decode(&image.bytes).inspect_err(|e| {
                    log::error!("uploaded image {} could not be decoded: {e}", image.name)
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut config = config.clone();
        if config.info.is_none() {
            config.info = Some(Info::for_issue(&self.publication, &self.month));
        }

        let composition = compose(&source.page_sizes(), text, images, &config)?;
        let bytes = composition.document.to_bytes()?;
        log::info!("rendered {} byte newsletter PDF", bytes.len());

        self.layout_bytes = Some(bytes);
        Ok(&*self.report.insert(composition.report))
    }

    /// Default name for the finished PDF
    pub fn output_file_name(&self) -> String {
        output_file_name(&self.publication, &self.month)
    }

    fn clear_layout(&mut self) {
        self.layout_bytes = None;
        self.report = None;
    }
}

/// `<publication>_newsletter_<month>.pdf`, lowercased with spaces as underscores:
/// "Dahlia Wood" and "October 2026" give `dahlia_wood_newsletter_october_2026.pdf`
pub fn output_file_name(publication: &str, month: &str) -> String {
    format!("{}_newsletter_{}.pdf", slug(publication), slug(month))
}

fn slug(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
