use thiserror::Error;

/// Error decoding or building a DNS message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("packet is smaller than header size")]
    HeaderTooShort,
    #[error("packet has incomplete data")]
    UnexpectedEOF,
    #[error("wrong (too short or too long) size of RDATA")]
    WrongRdataLength,
    #[error("label in domain name has unknown label format")]
    UnknownLabelFormat,
    #[error("label {0:?} is longer than 63 bytes")]
    LabelTooLong(String),
    #[error("compression pointer is out of range or loops")]
    BadPointer,
    #[error("invalid characters encountered while reading label")]
    LabelIsNotAscii,
}
