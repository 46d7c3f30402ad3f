use thiserror::Error;

/// All errors that the crate can generate
#[derive(Error, Debug)]
pub enum NewsletterError {
    #[error(transparent)]
    /// The inputs to a stage were missing or inconsistent
    Input(#[from] InputError),

    #[error(transparent)]
    /// The text generation service failed
    Service(#[from] ServiceError),

    #[error("page {page} could not be laid out: {source}")]
    /// A page could not be laid out
    PageLayout {
        page: usize,
        #[source]
        source: LayoutError,
    },

    #[error(transparent)]
    /// The generator was not configured
    Config(#[from] ConfigError),

    #[error(transparent)]
    /// An uploaded image could not be decoded or encoded
    Image(#[from] crate::image::ImageError),

    #[error("failed to read the source PDF: {0}")]
    /// [lopdf] failed to parse the previous issue
    Pdf(#[from] lopdf::Error),

    #[error(transparent)]
    /// An I/O error occurred
    Io(#[from] std::io::Error),
}

/// Problems with what the user handed in, reported before any work is attempted
#[derive(Error, Debug, PartialEq)]
pub enum InputError {
    #[error("the source PDF has no pages")]
    NoPages,

    #[error("{images} images were uploaded but the newsletter only has {pages} pages")]
    TooManyImages { images: usize, pages: usize },

    #[error("cannot {stage} before {missing}")]
    MissingStage {
        stage: &'static str,
        missing: &'static str,
    },
}

/// Failures of the text generation service. None of these are retried.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("could not reach the generation service: {0}")]
    Network(#[source] reqwest::Error),

    #[error("the generation service rejected the API key (HTTP {status})")]
    Auth { status: u16 },

    #[error("the generation service is rate limiting requests")]
    RateLimited,

    #[error("the generation service answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("the generation service response had no text content: {0}")]
    MalformedResponse(String),
}

/// Failures of the page layout engine
#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("there is no room for text once margins and images are removed")]
    EmptyLayout,
}

/// Configuration problems, surfaced before any generation attempt
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("the {var} environment variable is not set")]
    MissingApiKey { var: &'static str },
}
