mod export;
mod import;
pub mod pdf;

pub use export::*;
pub use import::*;
pub use pdf::PdfDocument;
