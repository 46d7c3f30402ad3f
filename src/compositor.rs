use crate::colour::{colours, Colour};
use crate::document::Document;
use crate::error::{InputError, NewsletterError};
use crate::font::BuiltinFont;
use crate::image::Image;
use crate::info::Info;
use crate::layout::{compute_regions, split_paragraphs, FlowCursor, FlowMetrics, Paragraph, TextRegion};
use crate::page::{ImageLayout, Page, TextLayout};
use crate::rect::Rect;
use crate::units::Pt;

/// What happens to paragraphs still waiting once every source page is full
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Leave them out and report how many were lost
    #[default]
    Drop,
    /// Keep adding image-less pages, the size of the last page, up to `max_pages` of them
    AppendPages { max_pages: usize },
}

/// Settings for laying the generated text out around the uploaded images
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Space kept clear around the page edges and between images and text
    pub margin: Pt,
    /// Images are scaled to this width, keeping their aspect ratio
    pub image_width: Pt,
    /// Distance of the image from the top and right edges of the page
    pub image_offset: Pt,
    pub metrics: FlowMetrics,
    pub font: BuiltinFont,
    pub colour: Colour,
    pub overflow: OverflowPolicy,
    pub info: Option<Info>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        CompositorConfig {
            margin: Pt(50.0),
            image_width: Pt(300.0),
            image_offset: Pt(50.0),
            metrics: FlowMetrics::default(),
            font: BuiltinFont::Helvetica,
            colour: colours::BLACK,
            overflow: OverflowPolicy::Drop,
            info: None,
        }
    }
}

/// How one page turned out
#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    /// 1-based page number in the output
    pub number: usize,
    pub image: Option<Rect>,
    pub regions: Vec<TextRegion>,
    /// Indices of the paragraphs placed on this page
    pub paragraphs: Vec<usize>,
    /// Whether the page was added for overflowing text
    pub continuation: bool,
}

/// What the compositor did with the generated text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutReport {
    pub pages: Vec<PageReport>,
    /// Number of paragraphs the text was split into
    pub paragraphs: usize,
    /// Paragraphs taller than a whole page, skipped
    pub oversized: usize,
    /// Paragraphs left over when the pages ran out
    pub overflowed: usize,
}

impl LayoutReport {
    pub fn placed(&self) -> usize {
        self.pages.iter().map(|p| p.paragraphs.len()).sum()
    }

    pub fn dropped(&self) -> usize {
        self.oversized + self.overflowed
    }
}

/// A laid out newsletter, ready to be written
pub struct Composition {
    pub document: Document,
    pub report: LayoutReport,
}

/// Lay `text` out over pages of the given sizes.
///
/// The text is split into paragraphs once, and the pages consume that single
/// sequence in turn: each page picks up at the first paragraph the previous
/// page had no room for. `images[i]` goes on page `i`, scaled to
/// [CompositorConfig::image_width] and anchored at the top-right corner; pages
/// past the end of `images` get none.
pub fn compose(
    page_sizes: &[(Pt, Pt)],
    text: &str,
    images: Vec<Image>,
    config: &CompositorConfig,
) -> Result<Composition, NewsletterError> {
    let Some(&last_size) = page_sizes.last() else {
        return Err(InputError::NoPages.into());
    };
    if images.len() > page_sizes.len() {
        return Err(InputError::TooManyImages {
            images: images.len(),
            pages: page_sizes.len(),
        }
        .into());
    }

    let paragraphs = split_paragraphs(text);
    let mut document = Document::default();
    if let Some(info) = &config.info {
        document.set_info(info.clone());
    }

    let mut flow = DocumentFlow {
        paragraphs: &paragraphs,
        next: 0,
        oversized: 0,
        config,
    };
    let mut pages: Vec<PageReport> = Vec::with_capacity(page_sizes.len());

    let mut images = images.into_iter();
    for (index, &(width, height)) in page_sizes.iter().enumerate() {
        let mut page = Page::new(width, height);
        let image_rect = match images.next() {
            Some(image) => {
                let rect = anchor_image(&image, width, height, config);
                let image_id = document.add_image(image);
                page.add_image(ImageLayout {
                    image_id,
                    position: rect,
                });
                Some(rect)
            }
            None => None,
        };

        let report = flow.fill_page(&mut page, index + 1, image_rect, false)?;
        pages.push(report);
        document.add_page(page);
    }

    if let OverflowPolicy::AppendPages { max_pages } = config.overflow {
        let (width, height) = last_size;
        let mut added = 0;
        while flow.remaining() > 0 && added < max_pages {
            let mut page = Page::new(width, height);
            let report = flow.fill_page(&mut page, pages.len() + 1, None, true)?;
            pages.push(report);
            document.add_page(page);
            added += 1;
        }
        if added > 0 {
            log::info!("added {added} continuation pages for overflowing text");
        }
    }

    let overflowed = flow.remaining();
    if overflowed > 0 {
        log::warn!(
            "{overflowed} of {} paragraphs did not fit on {} pages and were dropped",
            paragraphs.len(),
            pages.len()
        );
    }

    let report = LayoutReport {
        paragraphs: paragraphs.len(),
        oversized: flow.oversized,
        overflowed,
        pages,
    };
    log::info!(
        "laid out {} of {} paragraphs on {} pages",
        report.placed(),
        report.paragraphs,
        report.pages.len()
    );

    Ok(Composition { document, report })
}

/// Where an image goes: scaled to the configured width and anchored at the
/// top-right corner. Images that would not fit between the offsets are shrunk
/// further, keeping their aspect ratio.
fn anchor_image(image: &Image, page_width: Pt, page_height: Pt, config: &CompositorConfig) -> Rect {
    let max_width = (page_width - config.image_offset * 2.0).max(Pt(0.0));
    let max_height = (page_height - config.image_offset * 2.0).max(Pt(0.0));
    let (mut width, mut height) = image.scaled_to_width(config.image_width.min(max_width));
    if height > max_height {
        width = max_height / image.aspect_ratio();
        height = max_height;
    }
    let right = page_width - config.image_offset;
    Rect::new(
        right - width,
        config.image_offset,
        right,
        config.image_offset + height,
    )
}

/// The document-wide position in the paragraph sequence
struct DocumentFlow<'a> {
    paragraphs: &'a [Paragraph],
    next: usize,
    oversized: usize,
    config: &'a CompositorConfig,
}

impl DocumentFlow<'_> {
    fn remaining(&self) -> usize {
        self.paragraphs.len() - self.next
    }

    /// Flow as many of the waiting paragraphs onto `page` as its regions hold
    fn fill_page(
        &mut self,
        page: &mut Page,
        number: usize,
        image: Option<Rect>,
        continuation: bool,
    ) -> Result<PageReport, NewsletterError> {
        let config = self.config;
        let metrics = config.metrics;
        let images: Vec<Rect> = image.into_iter().collect();
        let regions = compute_regions(page.media_box(), config.margin, &images);
        let content_height = page.media_box().inset(config.margin).height();

        let mut cursor = FlowCursor::new(&regions).map_err(|source| {
            log::error!("page {number} has no text regions left with a {} margin", config.margin);
            NewsletterError::PageLayout {
                page: number,
                source,
            }
        })?;

        let mut placed = Vec::new();
        while let Some(paragraph) = self.paragraphs.get(self.next) {
            if metrics.text_height(paragraph) > content_height {
                log::warn!(
                    "paragraph {} has {} lines, more than fit on a page; skipping it",
                    self.next + 1,
                    paragraph.line_count()
                );
                self.oversized += 1;
                self.next += 1;
                continue;
            }

            let Some(placement) = cursor.place_next(paragraph, metrics) else {
                break;
            };
            log::debug!(
                "page {number}: paragraph {} in region {} at {:?}",
                self.next + 1,
                placement.region_index,
                placement.position
            );
            page.add_text(TextLayout {
                position: placement.position,
                lines: paragraph.lines().map(String::from).collect(),
                font: config.font,
                size: metrics.font_size,
                line_height: metrics.line_height(),
                colour: config.colour,
            });
            placed.push(self.next);
            self.next += 1;
        }
        if cursor.is_exhausted() {
            log::debug!("page {number}: all {} text regions are full", regions.len());
        }

        Ok(PageReport {
            number,
            image,
            regions,
            paragraphs: placed,
            continuation,
        })
    }
}
