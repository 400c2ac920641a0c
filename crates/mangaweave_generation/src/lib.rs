//! Structured generation for mangaweave.
//!
//! Models answer in free text. This crate turns that text into validated
//! payloads:
//!
//! - [`extract_json`] recovers the most plausible JSON object from noisy text
//! - [`GenerationLoop::generate_validated`] augments the prompt with the
//!   expected fields, validates the answer against a shape and re-prompts
//!   with the full violation list until it conforms or attempts run out
//! - [`Generated`] tells callers whether they got a real payload or the
//!   shape's default after exhausting the budget

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod extraction;
mod generation_loop;
mod outcome;
mod prompts;

pub use extraction::extract_json;
pub use generation_loop::GenerationLoop;
pub use outcome::Generated;
pub use prompts::{augment_prompt, corrective_prompt};
