//! Payload shapes for mangaweave.
//!
//! A [`Shape`] is plain data: a named list of [`Field`]s with their
//! [`FieldType`]s, requirement and defaults. One generic validator
//! ([`validate`]) interprets any shape, so adding a new structured output
//! means describing it, not writing parsing code.
//!
//! ```
//! use mangaweave_schema::{FieldType, Shape, validate};
//!
//! let shape = Shape::new("rating")
//!     .required("chapter_id", FieldType::String)
//!     .optional("score", FieldType::integer(0, 5), 0);
//!
//! let payload = validate(r#"{"chapter_id": "ch_001"}"#, &shape).unwrap();
//! assert_eq!(payload.int("score"), Some(0));
//!
//! let err = validate(r#"{"score": 9}"#, &shape).unwrap_err();
//! assert_eq!(err.violations().len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builtin;
mod payload;
mod registry;
mod shape;
mod validator;

pub use builtin::{ScaleBounds, names};
pub use payload::Payload;
pub use registry::ShapeRegistry;
pub use shape::{Coercion, Field, FieldType, Requirement, Shape};
pub use validator::{validate, validate_value};
