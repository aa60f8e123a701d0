use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort a report run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The transport failed or returned a payload of unexpected shape.
    #[error("fetch failed: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// A raw record lacked a required field or carried one of the wrong shape.
    #[error("invalid record: field `{field}` has value {value}")]
    Schema { field: &'static str, value: String },
    /// A power string could not be parsed.
    #[error("unparsable power value {input:?}")]
    Format { input: String },
    /// An artifact could not be written in full.
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch {
            message: message.into(),
            source: None,
        }
    }

    pub fn fetch_with(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Fetch {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn schema(field: &'static str, value: impl std::fmt::Debug) -> Self {
        Self::Schema {
            field,
            value: format!("{value:?}"),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Error::Fetch { .. } => "FetchError",
            Error::Schema { .. } => "SchemaError",
            Error::Format { .. } => "FormatError",
            Error::Write { .. } => "WriteError",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let message = match err.status() {
            Some(status) => format!("directory responded with {status}"),
            None => "request to the directory failed".to_string(),
        };
        Self::fetch_with(message, err)
    }
}
