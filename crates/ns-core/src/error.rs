use thiserror::Error;

pub type NsResult<T> = Result<T, NsError>;

/// Numeric failures shared by the EOS and integration layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NsError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
