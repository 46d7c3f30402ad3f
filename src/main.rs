//! newsletter-gen - Regenerate a monthly newsletter PDF
//!
//! Reads the previous issue, drafts the new issue's copy with a text
//! generation service, and lays that copy out around the uploaded images on
//! pages the same size as the previous issue's.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use newsletter_gen::generate::{current_month, from_config};
use newsletter_gen::layout::FlowMetrics;
use newsletter_gen::{
    BuiltinFont, Colour, CompositorConfig, GeneratorConfig, NewsletterJob, OverflowPolicy,
    Provider, Pt, SourceDocument, UploadedImage,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "newsletter-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use debug logging level
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text of a PDF
    Extract {
        /// Path to the PDF
        pdf: PathBuf,
    },
    /// Draft the new issue's copy and write it to a text file
    Generate {
        #[command(flatten)]
        issue: IssueArgs,
        #[command(flatten)]
        events: EventArgs,
        #[command(flatten)]
        service: ServiceArgs,
        /// Where to write the generated text
        #[arg(short, long, default_value = "newsletter.txt")]
        out: PathBuf,
    },
    /// Lay out an existing text file as the new issue's PDF
    Compose {
        #[command(flatten)]
        issue: IssueArgs,
        /// Text file with the newsletter copy, paragraphs separated by blank lines
        #[arg(short, long)]
        text: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Where to write the PDF (defaults to the issue's download name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Generate the copy, then lay it out
    Run {
        #[command(flatten)]
        issue: IssueArgs,
        #[command(flatten)]
        events: EventArgs,
        #[command(flatten)]
        service: ServiceArgs,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Also keep the generated text in this file
        #[arg(long)]
        text_out: Option<PathBuf>,
        /// Where to write the PDF (defaults to the issue's download name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct IssueArgs {
    /// The previous issue, as a PDF
    #[arg(short, long)]
    source: PathBuf,

    /// Images for the new issue, one per page in page order
    #[arg(short, long = "image")]
    images: Vec<PathBuf>,

    /// Name of the newsletter
    #[arg(long, env = "NEWSLETTER_PUBLICATION", default_value = "Dahlia Wood")]
    publication: String,

    /// Month of the new issue, e.g. "October 2026" (defaults to this month)
    #[arg(long)]
    month: Option<String>,
}

#[derive(Args, Debug)]
struct EventArgs {
    /// Details of the events to cover
    #[arg(short, long, conflicts_with = "events_file")]
    events: Option<String>,

    /// Read the event details from a file
    #[arg(long)]
    events_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServiceArgs {
    /// Text generation service
    #[arg(long, value_enum, env = "NEWSLETTER_PROVIDER", default_value_t = Provider::Cohere)]
    provider: Provider,

    /// Model name (defaults to the provider's)
    #[arg(long, env = "NEWSLETTER_MODEL")]
    model: Option<String>,

    /// Maximum number of tokens to generate
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    /// Margin around the page edges and around images, in points
    #[arg(long, default_value = "50")]
    margin: f32,

    /// Width images are scaled to, in points
    #[arg(long, default_value = "300")]
    image_width: f32,

    /// Distance of each image from the top and right page edges, in points
    #[arg(long, default_value = "50")]
    image_offset: f32,

    /// Font size, in points
    #[arg(long, default_value = "11")]
    font_size: f32,

    /// Line height as a multiple of the font size
    #[arg(long, default_value = "1.2")]
    line_height: f32,

    /// One of the standard PDF fonts: Helvetica, Helvetica-Bold, Times-Roman, Times-Bold, Courier
    #[arg(long, default_value = "Helvetica", value_parser = parse_font)]
    font: BuiltinFont,

    /// Text colour as a hex code
    #[arg(long, default_value = "#000000", value_parser = parse_colour)]
    colour: Colour,

    /// Add up to this many pages for text that does not fit, instead of dropping it
    #[arg(long)]
    append_pages: Option<usize>,
}

fn parse_font(s: &str) -> Result<BuiltinFont, String> {
    BuiltinFont::from_name(s).ok_or_else(|| format!("unknown font '{s}'"))
}

fn parse_colour(s: &str) -> Result<Colour, String> {
    Colour::from_hex(s).ok_or_else(|| format!("'{s}' is not a hex colour"))
}

impl LayoutArgs {
    fn compositor_config(&self) -> Result<CompositorConfig> {
        if self.font_size <= 0.0 || self.line_height <= 0.0 {
            bail!("font size and line height must be positive");
        }
        if self.margin < 0.0 || self.image_width <= 0.0 || self.image_offset < 0.0 {
            bail!("margin, image width and image offset cannot be negative");
        }

        Ok(CompositorConfig {
            margin: Pt(self.margin),
            image_width: Pt(self.image_width),
            image_offset: Pt(self.image_offset),
            metrics: FlowMetrics {
                font_size: Pt(self.font_size),
                line_height_factor: self.line_height,
            },
            font: self.font,
            colour: self.colour,
            overflow: match self.append_pages {
                Some(max_pages) => OverflowPolicy::AppendPages { max_pages },
                None => OverflowPolicy::Drop,
            },
            info: None,
        })
    }
}

impl ServiceArgs {
    fn generator_config(&self) -> Result<GeneratorConfig> {
        let mut config = GeneratorConfig::from_env(self.provider)?;
        if let Some(model) = &self.model {
            config = config.with_model(model.as_str());
        }
        if let Some(max_tokens) = self.max_tokens {
            config.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = Duration::from_secs(timeout);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Extract { pdf } => {
            let source = read_source(&pdf)?;
            print!("{}", source.text());
        }
        Command::Generate {
            issue,
            events,
            service,
            out,
        } => {
            let mut job = load_job(&issue)?;
            generate(&mut job, &events, &service)?;
            write_text(&job, &out)?;
        }
        Command::Compose {
            issue,
            text,
            layout,
            out,
        } => {
            let mut job = load_job(&issue)?;
            let text = fs::read_to_string(&text)
                .with_context(|| format!("failed to read {}", text.display()))?;
            job.set_generated_text(text);
            compose(&mut job, &layout, out)?;
        }
        Command::Run {
            issue,
            events,
            service,
            layout,
            text_out,
            out,
        } => {
            let mut job = load_job(&issue)?;
            generate(&mut job, &events, &service)?;
            if let Some(text_out) = text_out {
                write_text(&job, &text_out)?;
            }
            compose(&mut job, &layout, out)?;
        }
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<SourceDocument> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    SourceDocument::from_bytes(&bytes)
        .with_context(|| format!("failed to extract text from {}", path.display()))
}

fn load_job(issue: &IssueArgs) -> Result<NewsletterJob> {
    let month = issue.month.clone().unwrap_or_else(current_month);
    let mut job = NewsletterJob::new(issue.publication.as_str(), month);
    job.set_source(read_source(&issue.source)?);

    for path in &issue.images {
        let image = UploadedImage::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        job.add_image(image);
    }

    Ok(job)
}

fn generate(job: &mut NewsletterJob, events: &EventArgs, service: &ServiceArgs) -> Result<()> {
    let details = match (&events.events, &events.events_file) {
        (Some(events), _) => events.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => {
            log::info!("no event details given, generating from the previous issue alone");
            String::new()
        }
    };
    job.set_events(details);

    let config = service.generator_config()?;
    log::info!("using {} model {}", config.provider, config.model);
    let generator = from_config(config)?;
    job.generate(generator.as_ref())
        .context("failed to generate the newsletter text")?;
    Ok(())
}

fn write_text(job: &NewsletterJob, path: &Path) -> Result<()> {
    let text = job.generated_text().unwrap_or_default();
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("wrote generated text to {}", path.display());
    Ok(())
}

fn compose(job: &mut NewsletterJob, layout: &LayoutArgs, out: Option<PathBuf>) -> Result<()> {
    let config = layout.compositor_config()?;
    let report = job
        .compose(&config)
        .context("failed to lay out the newsletter")?;
    if report.dropped() > 0 {
        log::warn!(
            "{} of {} paragraphs were left out of the PDF",
            report.dropped(),
            report.paragraphs
        );
    }

    let out = out.unwrap_or_else(|| PathBuf::from(job.output_file_name()));
    let bytes = job.layout_bytes().unwrap_or_default();
    fs::write(&out, bytes).with_context(|| format!("failed to write {}", out.display()))?;
    log::info!("wrote {}", out.display());
    Ok(())
}
