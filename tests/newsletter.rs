use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use newsletter_gen::generate::GenerationRequest;
use newsletter_gen::{
    CompositorConfig, NewsletterJob, OverflowPolicy, ServiceError, SourceDocument, TextGenerator,
    UploadedImage,
};
use std::io::Cursor;

/// A previous issue with one page per entry in `sizes`
fn previous_issue(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Times-Roman",
    });

    let mut kids: Vec<Object> = Vec::new();
    for (i, &(width, height)) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 14.into()]),
                Operation::new("Td", vec![60.into(), (height - 80).into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("September issue, page {}", i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let media_box: Vec<Object> = vec![0.into(), 0.into(), width.into(), height.into()];
        kids.push(
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => media_box,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            })
            .into(),
        );
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }
        .into(),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn photo(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageOutputFormat::Jpeg(85))
        .unwrap();
    bytes.into_inner()
}

/// Answers every request with filler paragraphs
struct Filler {
    paragraphs: usize,
}

impl TextGenerator for Filler {
    fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        let mut paragraphs = vec![format!("{} Newsletter, {}", request.publication, request.month)];
        paragraphs.extend((1..self.paragraphs).map(|i| lipsum::lipsum_words(8 + i % 5)));
        Ok(paragraphs.join("\n\n"))
    }
}

#[test]
fn regenerates_an_issue_on_the_same_pages() {
    let mut job = NewsletterJob::new("Dahlia Wood", "October 2026");
    job.load_source(&previous_issue(&[(612, 792), (612, 792), (595, 842)]))
        .unwrap();
    job.set_events("Bulb swap at the community hall on the 12th");
    job.add_image(UploadedImage::new("hall.jpg", photo(400, 300)));
    job.add_image(UploadedImage::new("bulbs.jpg", photo(300, 400)));

    job.generate(&Filler { paragraphs: 12 }).unwrap();
    assert!(job
        .generated_text()
        .unwrap()
        .starts_with("Dahlia Wood Newsletter, October 2026"));

    let report = job.compose(&CompositorConfig::default()).unwrap().clone();
    assert_eq!(report.paragraphs, 12);
    assert_eq!(report.placed(), 12);
    assert_eq!(report.dropped(), 0);
    assert!(report.pages[0].image.is_some());
    assert!(report.pages[1].image.is_some());
    assert!(report.pages[2].image.is_none());

    let output = SourceDocument::from_bytes(job.layout_bytes().unwrap()).unwrap();
    assert_eq!(output.page_sizes(), job.source().unwrap().page_sizes());
    assert_eq!(
        job.output_file_name(),
        "dahlia_wood_newsletter_october_2026.pdf"
    );

    let reloaded = Document::load_mem(job.layout_bytes().unwrap()).unwrap();
    let info = reloaded.trailer.get(b"Info").and_then(Object::as_reference).unwrap();
    let title = reloaded
        .get_dictionary(info)
        .unwrap()
        .get(b"Title")
        .and_then(Object::as_str)
        .unwrap();
    assert_eq!(title, b"Dahlia Wood Newsletter - October 2026");
}

#[test]
fn long_copy_spreads_over_pages_and_can_overflow() {
    let source = previous_issue(&[(612, 792), (612, 792)]);
    let mut job = NewsletterJob::new("Dahlia Wood", "October 2026");
    job.load_source(&source).unwrap();
    let copy = (0..200)
        .map(|i| format!("Item {i}\nsecond line"))
        .collect::<Vec<_>>()
        .join("\n\n");
    job.set_generated_text(copy);

    let report = job.compose(&CompositorConfig::default()).unwrap().clone();
    assert_eq!(report.pages.len(), 2);
    assert!(report.overflowed > 0);
    assert_eq!(report.placed() + report.dropped(), 200);

    // every page resumes right after the last paragraph of the one before it
    let order: Vec<usize> = report.pages.iter().flat_map(|p| p.paragraphs.clone()).collect();
    assert_eq!(order, (0..report.placed()).collect::<Vec<_>>());

    let appended = job
        .compose(&CompositorConfig {
            overflow: OverflowPolicy::AppendPages { max_pages: 20 },
            ..CompositorConfig::default()
        })
        .unwrap()
        .clone();
    assert_eq!(appended.dropped(), 0);
    assert!(appended.pages.len() > 2);

    let pages = Document::load_mem(job.layout_bytes().unwrap())
        .unwrap()
        .get_pages()
        .len();
    assert_eq!(pages, appended.pages.len());
}
