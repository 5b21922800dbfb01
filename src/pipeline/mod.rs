//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the rendering backend can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ archive
//! (bytes)   (pdfium)   (PNG)      (ZIP, stored)
//!              ▲                      ▲
//!              └──── orchestrate ─────┘
//! ```
//!
//! 1. [`input`]   — read a local path or download a URL into memory
//! 2. [`render`]  — decode with pdfium and rasterise one page per call
//! 3. [`encode`]  — PNG-encode the surface and build the preview data URL
//! 4. [`archive`] — accumulate named entries into a ZIP
//! 5. [`orchestrate`] — the sequential per-page loop tying 2–4 together

pub mod archive;
pub mod encode;
pub mod input;
pub mod orchestrate;
pub mod render;
