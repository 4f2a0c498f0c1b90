//! Envelope types shared by every stage.
//!
//! This module contains:
//! - The typed metadata bag and its key trait
//! - Logical and wire request envelopes
//! - Body handles and the rewind reader
//! - The raw response envelope
//! - The stage outcome type

mod body;
mod metadata;
mod outcome;
mod request;
mod response;

pub use body::{Body, ReadSeek, RewindError, RewindReader, WireBody};
pub use metadata::{Key, Metadata};
pub use outcome::Outcome;
pub use request::{Request, WireRequest};
pub use response::WireResponse;
