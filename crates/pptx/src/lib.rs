//! PPTX (Office Open XML) template backend for slide-deck mail merge.
//!
//! Opens .pptx files (ZIP archives of XML parts), exposes the text of every
//! shape as a text unit, and writes the package back with only rewritten
//! text bodies changed.

pub mod document;
mod parser;

pub use document::PptxDocument;
