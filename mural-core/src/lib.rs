//! Shared primitives for the mural 2D rendering engine.
//!
//! This crate holds the types the asset pipeline and the bitmap-text
//! subsystem exchange without either depending on the other:
//!
//! - `Texture` / `TextureSource` / `Rect` — CPU-side texture handles with
//!   sub-rectangle framing
//! - The `Surface` drawing trait and `SurfacePool` — the host canvas
//!   collaborator, pooled by size with exclusive checkout ownership
//! - The `Platform` adapter trait — fetch and surface creation injected by
//!   the host so the pipeline stays host-agnostic

pub mod error;
pub mod platform;
pub mod surface;
pub mod texture;

// Re-export main types for convenience
pub use error::CoreError;
pub use platform::{FetchedData, Platform};
pub use surface::{DrawMode, ShadowParams, Surface, SurfacePool, TextDrawPass};
pub use texture::{Rect, Texture, TextureSource};
