use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlipperError {
    #[error("Invalid Steam Market URL")]
    InvalidMarketUrl,

    #[error("Invalid config value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
