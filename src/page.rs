use crate::colour::Colour;
use crate::font::{encode_win_ansi, BuiltinFont};
use crate::image::Image;
use crate::rect::Rect;
use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use id_arena::{Arena, Id};
use miniz_oxide::deflate::{compress_to_vec_zlib, CompressionLevel};
use pdf_writer::{Filter, Finish, Name, Pdf};
use std::io::Write;

/// A block of text drawn line by line from a top-left anchor
#[derive(Clone, PartialEq, Debug)]
pub struct TextLayout {
    /// Top-left corner of the block, in page space
    pub position: (Pt, Pt),
    pub lines: Vec<String>,
    pub font: BuiltinFont,
    pub size: Pt,
    /// Distance between consecutive baselines
    pub line_height: Pt,
    pub colour: Colour,
}

impl TextLayout {
    /// Baseline of the given line in page space. The first baseline sits one
    /// font size below the top of the block.
    pub fn baseline(&self, line: usize) -> Pt {
        self.position.1 + self.size + self.line_height * line as f32
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct ImageLayout {
    pub image_id: Id<Image>,
    /// Where the image is stretched to, in page space
    pub position: Rect,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PageContents {
    Text(TextLayout),
    Image(ImageLayout),
}

/// A single output page. Contents are drawn in the order they were added.
pub struct Page {
    pub width: Pt,
    pub height: Pt,
    pub contents: Vec<PageContents>,
}

impl Page {
    pub fn new(width: Pt, height: Pt) -> Page {
        Page {
            width,
            height,
            contents: Vec::default(),
        }
    }

    /// The whole page as a rectangle in page space
    pub fn media_box(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn add_text(&mut self, text: TextLayout) {
        self.contents.push(PageContents::Text(text));
    }

    pub fn add_image(&mut self, image: ImageLayout) {
        self.contents.push(PageContents::Image(image));
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageLayout> {
        self.contents.iter().filter_map(|c| match c {
            PageContents::Image(image) => Some(image),
            PageContents::Text(_) => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextLayout> {
        self.contents.iter().filter_map(|c| match c {
            PageContents::Text(text) => Some(text),
            PageContents::Image(_) => None,
        })
    }

    /// The distinct fonts used on this page, in a stable order
    pub fn fonts(&self) -> Vec<BuiltinFont> {
        let mut fonts: Vec<BuiltinFont> = self.texts().map(|t| t.font).collect();
        fonts.sort_by_key(|f| f.index());
        fonts.dedup();
        fonts
    }

    /// Render the page contents to PDF content stream operators
    #[allow(clippy::write_with_newline)]
    pub(crate) fn render(&self) -> Result<Vec<u8>, std::io::Error> {
        let mut content: Vec<u8> = Vec::default();

        for page_content in self.contents.iter() {
            match page_content {
                PageContents::Text(text) => {
                    if text.lines.is_empty() {
                        continue;
                    }
                    write!(&mut content, "q\n")?;
                    write!(&mut content, "/{} {} Tf\n", text.font.resource_name(), text.size)?;
                    text.colour.write_fill(&mut content)?;
                    write!(&mut content, "BT\n")?;
                    write!(
                        &mut content,
                        "{} {} Td\n",
                        text.position.0,
                        self.height - text.baseline(0)
                    )?;
                    for (i, line) in text.lines.iter().enumerate() {
                        if i > 0 {
                            write!(&mut content, "0 {} Td\n", Pt(0.0) - text.line_height)?;
                        }
                        write!(&mut content, "<")?;
                        for byte in encode_win_ansi(line) {
                            write!(&mut content, "{byte:02x}")?;
                        }
                        write!(&mut content, "> Tj\n")?;
                    }
                    write!(&mut content, "ET\n")?;
                    write!(&mut content, "Q\n")?;
                }
                PageContents::Image(image) => {
                    let rect = image.position.to_pdf(self.height);
                    write!(&mut content, "q\n")?;
                    write!(
                        &mut content,
                        "{} 0 0 {} {} {} cm\n",
                        rect.x2 - rect.x1,
                        rect.y2 - rect.y1,
                        rect.x1,
                        rect.y1
                    )?;
                    write!(&mut content, "/I{} Do\n", image.image_id.index())?;
                    write!(&mut content, "Q\n")?;
                }
            }
        }

        Ok(content)
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        page_index: usize,
        images: &Arena<Image>,
        writer: &mut Pdf,
    ) -> Result<(), std::io::Error> {
        let missing = |what: &str| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no object written for {what}"),
            )
        };

        let id = refs
            .get(RefType::Page(page_index))
            .ok_or_else(|| missing("page"))?;
        let parent = refs
            .get(RefType::PageTree)
            .ok_or_else(|| missing("page tree"))?;
        let content_id = refs.gen(RefType::ContentForPage(page_index));

        let mut page = writer.page(id);
        page.media_box(self.media_box().to_pdf(self.height));
        page.parent(parent);

        let mut resources = page.resources();
        let mut resource_fonts = resources.fonts();
        for font in self.fonts() {
            let font_ref = refs
                .get(RefType::Font(font.index()))
                .ok_or_else(|| missing(font.base_font()))?;
            resource_fonts.pair(Name(font.resource_name().as_bytes()), font_ref);
        }
        resource_fonts.finish();

        let mut resource_xobjects = resources.x_objects();
        for image in self.images() {
            if images.get(image.image_id).is_none() {
                return Err(missing("image"));
            }
            let image_ref = refs
                .get(RefType::Image(image.image_id.index()))
                .ok_or_else(|| missing("image"))?;
            resource_xobjects.pair(
                Name(format!("I{}", image.image_id.index()).as_bytes()),
                image_ref,
            );
        }
        resource_xobjects.finish();
        resources.finish();

        page.contents(content_id);
        page.finish();

        let rendered = self.render()?;
        let compressed = compress_to_vec_zlib(&rendered, CompressionLevel::DefaultLevel as u8);
        writer
            .stream(content_id, compressed.as_slice())
            .filter(Filter::FlateDecode);

        Ok(())
    }
}
