use super::regions::TextRegion;
use crate::error::LayoutError;
use crate::units::Pt;

/// A block of text, one or more lines long, laid out as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    text: String,
}

impl Paragraph {
    pub fn new<S: Into<String>>(text: S) -> Paragraph {
        Paragraph { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The lines of the paragraph, split on explicit line breaks only
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }

    /// Number of explicit lines; text is never re-wrapped to fit a region
    pub fn line_count(&self) -> usize {
        self.lines().count()
    }
}

/// Split generated text into paragraphs on blank lines. Lines that only hold
/// whitespace count as blank, and runs of blank lines never produce empty
/// paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<Paragraph> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(Paragraph::new(current.join("\n")));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(Paragraph::new(current.join("\n")));
    }

    paragraphs
}

/// Typographic settings the flow engine measures paragraphs with
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FlowMetrics {
    pub font_size: Pt,
    /// Line height as a multiple of the font size
    pub line_height_factor: f32,
}

impl Default for FlowMetrics {
    fn default() -> Self {
        FlowMetrics {
            font_size: Pt(11.0),
            line_height_factor: 1.2,
        }
    }
}

impl FlowMetrics {
    pub fn line_height(&self) -> Pt {
        self.font_size * self.line_height_factor
    }

    /// Vertical space taken by a paragraph, not counting the gap after it
    pub fn text_height(&self, paragraph: &Paragraph) -> Pt {
        self.line_height() * paragraph.line_count() as f32
    }

    /// Gap left between consecutive paragraphs
    pub fn spacing(&self) -> Pt {
        self.font_size
    }
}

/// A paragraph that has been given a spot on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedParagraph<'p> {
    pub paragraph: &'p Paragraph,
    /// Index of the region within the page's region list
    pub region_index: usize,
    pub region: TextRegion,
    /// Top-left corner of the paragraph, in page space
    pub position: (Pt, Pt),
    pub height: Pt,
}

/// Tracks where the next paragraph goes within one page's regions.
///
/// A cursor never outlives the page it was created for.
#[derive(Debug, Clone)]
pub struct FlowCursor<'r> {
    regions: &'r [TextRegion],
    region_index: usize,
    cursor_y: Pt,
}

impl<'r> FlowCursor<'r> {
    /// Start at the top of the first region. Fails if there are no regions at all.
    pub fn new(regions: &'r [TextRegion]) -> Result<FlowCursor<'r>, LayoutError> {
        let first = regions.first().ok_or(LayoutError::EmptyLayout)?;
        Ok(FlowCursor {
            regions,
            region_index: 0,
            cursor_y: first.top(),
        })
    }

    /// Whether every region has been used up
    pub fn is_exhausted(&self) -> bool {
        self.region_index >= self.regions.len()
    }

    /// Place the next paragraph at the cursor, moving on to later regions until
    /// one has room for it. Regions skipped on the way are never revisited, even
    /// if a later, shorter paragraph would fit in them. Returns [None] once the
    /// regions are exhausted; the cursor stays exhausted after that.
    pub fn place_next<'p>(
        &mut self,
        paragraph: &'p Paragraph,
        metrics: FlowMetrics,
    ) -> Option<PlacedParagraph<'p>> {
        let height = metrics.text_height(paragraph);

        loop {
            let region = *self.regions.get(self.region_index)?;

            if self.cursor_y + height <= region.bottom() {
                let placed = PlacedParagraph {
                    paragraph,
                    region_index: self.region_index,
                    region,
                    position: (region.left(), self.cursor_y),
                    height,
                };
                self.cursor_y += height + metrics.spacing();
                return Some(placed);
            }

            self.region_index += 1;
            if let Some(next) = self.regions.get(self.region_index) {
                self.cursor_y = next.top();
            }
        }
    }
}

/// Flows `paragraphs` into `regions` in order, stopping at the first paragraph
/// that no remaining region has room for. The placements are always a prefix
/// of `paragraphs`; whatever is left over is the caller's to deal with.
///
/// ```
/// use newsletter_gen::layout::{compute_regions, flow, split_paragraphs, FlowMetrics};
/// use newsletter_gen::{Pt, Rect};
///
/// let regions = compute_regions(Rect::from_size(Pt(800.0), Pt(1000.0)), Pt(50.0), &[]);
/// let paragraphs = split_paragraphs("One.\n\nTwo.\n\nThree.");
/// let placed = flow(&regions, &paragraphs, FlowMetrics::default()).expect("page has regions");
///
/// assert_eq!(placed.len(), 3);
/// assert_eq!(placed[0].position, (Pt(50.0), Pt(50.0)));
/// ```
pub fn flow<'p>(
    regions: &[TextRegion],
    paragraphs: &'p [Paragraph],
    metrics: FlowMetrics,
) -> Result<Vec<PlacedParagraph<'p>>, LayoutError> {
    let mut cursor = FlowCursor::new(regions)?;
    let mut placed = Vec::with_capacity(paragraphs.len());

    for paragraph in paragraphs {
        match cursor.place_next(paragraph, metrics) {
            Some(placement) => placed.push(placement),
            None => break,
        }
    }

    if placed.len() < paragraphs.len() {
        log::debug!(
            "regions exhausted after {} of {} paragraphs",
            placed.len(),
            paragraphs.len()
        );
    }

    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_regions, RegionKind};
    use crate::rect::Rect;

    fn approx(a: Pt, b: f32) -> bool {
        (a.0 - b).abs() < 1e-3
    }

    fn single_region_page() -> Vec<TextRegion> {
        compute_regions(Rect::from_size(Pt(800.0), Pt(1000.0)), Pt(50.0), &[])
    }

    #[test]
    fn splits_on_blank_lines() {
        let paragraphs = split_paragraphs(
            "Dahlia Wood News\r\nOctober 2026\r\n\r\nFirst item.\n\n\n  \nSecond item\nspans two lines.  \n",
        );
        assert_eq!(
            paragraphs,
            vec![
                Paragraph::new("Dahlia Wood News\nOctober 2026"),
                Paragraph::new("First item."),
                Paragraph::new("Second item\nspans two lines."),
            ]
        );
        assert_eq!(paragraphs[0].line_count(), 2);
        assert!(split_paragraphs("\n\n   \n").is_empty());
    }

    #[test]
    fn three_short_paragraphs_stack_from_the_top() {
        let regions = single_region_page();
        let paragraphs = split_paragraphs("One.\n\nTwo.\n\nThree.");
        let placed = flow(&regions, &paragraphs, FlowMetrics::default()).unwrap();

        assert_eq!(placed.len(), 3);
        assert!(approx(placed[0].position.1, 50.0));
        assert!(approx(placed[1].position.1, 74.2));
        assert!(approx(placed[2].position.1, 98.4));
        for p in &placed {
            assert_eq!(p.position.0, Pt(50.0));
            assert_eq!(p.region_index, 0);
        }
    }

    #[test]
    fn overflow_drops_the_tail_without_failing() {
        let regions = single_region_page();
        let paragraphs: Vec<Paragraph> = (0..20)
            .map(|i| Paragraph::new(format!("line {i}\n").repeat(4).trim_end().to_string()))
            .collect();
        let metrics = FlowMetrics::default();
        let placed = flow(&regions, &paragraphs, metrics).unwrap();

        assert!(placed.len() < paragraphs.len());
        // 4 lines * 13.2 + 11 = 63.8 per paragraph, 900 tall: 14 fit
        assert_eq!(placed.len(), 14);
        for (p, original) in placed.iter().zip(&paragraphs) {
            assert_eq!(p.paragraph, original);
        }
    }

    #[test]
    fn moves_to_the_next_region_when_full() {
        let page = Rect::from_size(Pt(800.0), Pt(1000.0));
        let image = Rect::new(Pt(500.0), Pt(50.0), Pt(750.0), Pt(200.0));
        let regions = compute_regions(page, Pt(50.0), &[image]);
        assert_eq!(regions[0].kind, RegionKind::Left);

        // the left column is 150 tall: two 5-line paragraphs (66 each + 11) fit, the third does not
        let paragraphs: Vec<Paragraph> = (0..3).map(|_| Paragraph::new("a\nb\nc\nd\ne")).collect();
        let placed = flow(&regions, &paragraphs, FlowMetrics::default()).unwrap();

        assert_eq!(placed.len(), 3);
        assert_eq!(placed[0].region_index, 0);
        assert_eq!(placed[1].region_index, 0);
        assert_eq!(placed[2].region_index, 1);
        assert_eq!(placed[2].position, (Pt(50.0), Pt(250.0)));
    }

    #[test]
    fn tall_paragraph_skips_regions_that_are_too_short() {
        let page = Rect::from_size(Pt(800.0), Pt(1000.0));
        let image = Rect::new(Pt(500.0), Pt(50.0), Pt(750.0), Pt(200.0));
        let regions = compute_regions(page, Pt(50.0), &[image]);

        // 20 lines = 264pt: taller than the 150pt left column
        let paragraphs = vec![Paragraph::new(vec!["x"; 20].join("\n"))];
        let placed = flow(&regions, &paragraphs, FlowMetrics::default()).unwrap();
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].region.kind, RegionKind::Remainder);
    }

    #[test]
    fn no_regions_is_an_error() {
        let paragraphs = split_paragraphs("text");
        assert_eq!(
            flow(&[], &paragraphs, FlowMetrics::default()),
            Err(LayoutError::EmptyLayout)
        );
    }

    #[test]
    fn cursor_stays_exhausted() {
        let regions = single_region_page();
        let mut cursor = FlowCursor::new(&regions).unwrap();
        let huge = Paragraph::new(vec!["x"; 100].join("\n"));
        let small = Paragraph::new("fits anywhere");

        assert!(cursor.place_next(&huge, FlowMetrics::default()).is_none());
        assert!(cursor.is_exhausted());
        assert!(cursor.place_next(&small, FlowMetrics::default()).is_none());
    }

    #[test]
    fn placements_stay_inside_their_regions_and_are_repeatable() {
        let page = Rect::from_size(Pt(612.0), Pt(792.0));
        let images = [
            Rect::new(Pt(262.0), Pt(50.0), Pt(562.0), Pt(250.0)),
            Rect::new(Pt(100.0), Pt(400.0), Pt(300.0), Pt(500.0)),
        ];
        let regions = compute_regions(page, Pt(50.0), &images);
        let text = lipsum::lipsum_words(400)
            .split(". ")
            .map(|sentence| sentence.replace(", ", ",\n"))
            .collect::<Vec<_>>()
            .join("\n\n");
        let paragraphs = split_paragraphs(&text);
        let metrics = FlowMetrics {
            font_size: Pt(9.0),
            line_height_factor: 1.4,
        };

        let first = flow(&regions, &paragraphs, metrics).unwrap();
        let second = flow(&regions, &paragraphs, metrics).unwrap();
        assert_eq!(first, second);

        for placed in &first {
            let y = placed.position.1;
            assert!(y >= placed.region.top() && y <= placed.region.bottom());
        }

        // placements are a prefix of the input, in order
        for (placed, paragraph) in first.iter().zip(&paragraphs) {
            assert!(std::ptr::eq(placed.paragraph, paragraph));
        }

        // per-region stacks never exceed the region by more than the trailing gap
        for (index, region) in regions.iter().enumerate() {
            let used: Pt = first
                .iter()
                .filter(|p| p.region_index == index)
                .map(|p| p.height + metrics.spacing())
                .sum();
            assert!(used <= region.rect.height() + metrics.spacing() + Pt(1e-3));
        }
    }
}
