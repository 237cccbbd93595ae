//! Error types for the designer crate.
//!
//! [`BlockError`] covers tree edits and block operations, [`CodecError`]
//! covers reading and writing program files.

use std::io;
use thiserror::Error;

use crate::block::{BlockKind, Operation};

/// Errors from block tree operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockError {
    /// The id does not name a live block.
    #[error("Block not found")]
    NotFound,

    /// The block kind does not implement the operation.
    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: BlockKind,
        operation: Operation,
    },

    /// The block cannot be placed under the requested parent.
    #[error("{child} cannot be placed under {parent}")]
    InvalidParent { parent: String, child: BlockKind },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Result type alias for block operations.
pub type Result<T> = std::result::Result<T, BlockError>;

/// Errors from the binary and XML codecs.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The data does not start with the binary magic.
    #[error("Not a gcam file")]
    BadMagic,

    /// The binary version byte is not understood.
    #[error("Unsupported file version {0}")]
    UnsupportedVersion(u8),

    /// A read ran past the end of its enclosing record.
    #[error("Truncated data at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A fixed-size field has the wrong length.
    #[error("Field 0x{tag:02x} has length {actual}, expected {expected}")]
    FieldLength {
        tag: u8,
        expected: usize,
        actual: usize,
    },

    /// The block type byte is not known.
    #[error("Unknown block type 0x{0:02x}")]
    UnknownBlockType(u8),

    /// A field decoded to an out-of-range value.
    #[error("Invalid value for field 0x{tag:02x}: {reason}")]
    InvalidValue { tag: u8, reason: String },

    /// A text field is not valid UTF-8.
    #[error("Invalid UTF-8 text: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The XML document is malformed.
    #[error("XML error: {0}")]
    Xml(String),

    /// An XML element does not name a block kind.
    #[error("Unknown element <{0}>")]
    UnknownElement(String),

    /// An XML attribute value cannot be parsed.
    #[error("Invalid attribute {name}=\"{value}\"")]
    InvalidAttribute { name: String, value: String },

    /// A block is nested where its kind is not allowed.
    #[error("Invalid block placement: {0}")]
    Placement(#[from] BlockError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
