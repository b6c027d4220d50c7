// src/render/mod.rs
pub mod bands;
pub mod html;

// Re-export key rendering types for convenience
pub use bands::BandSet;
pub use html::HtmlRenderer;
