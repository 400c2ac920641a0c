//! Trait definitions for generation backends.
//!
//! The pipeline only ever talks to a model through [`MangaweaveDriver`];
//! concrete providers live in `mangaweave_models`, tests supply scripted mocks.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::MangaweaveDriver;
