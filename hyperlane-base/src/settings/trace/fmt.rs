use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

/// Basic tracing configuration
#[derive(Debug, Clone, Copy, clap::ValueEnum, Default, PartialEq, Eq, Hash)]
pub enum Style {
    /// Pretty print
    Pretty,
    /// JSON
    Json,
    /// Compact
    Compact,
    /// Default style
    #[default]
    Full,
}

/// The fmt layer selected by a [`Style`], boxed so that every style has the
/// same type.
pub type LogOutputLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

impl Style {
    /// Build the stdout layer for this style.
    pub fn layer<S>(self) -> LogOutputLayer<S>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    {
        let layer = fmt::layer().with_target(true);
        match self {
            Style::Pretty => layer.pretty().boxed(),
            Style::Json => layer.json().with_current_span(true).boxed(),
            Style::Compact => layer.compact().boxed(),
            Style::Full => layer.boxed(),
        }
    }
}
