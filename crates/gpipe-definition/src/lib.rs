//! gpipe Definition
//!
//! The declarative description of a multi-step pipeline submitted to the
//! orchestrator. A [`Pipeline`] carries an arbitrary input payload and an
//! ordered list of [`Step`]s; steps name a remote function and wire data in
//! and out through addressing expressions (`xin`/`xout`).
//!
//! Expressions are kept as opaque strings. Their only processing is the
//! dedent-and-trim applied when they are set, see [`normalize_expression`].
//!
//! ```
//! use gpipe_definition::{Pipeline, Step};
//!
//! let mut pipeline = Pipeline::new().with_input("Dolomiti");
//! pipeline
//!   .add_step(Step::call("wikipedia/it").with_xin("{ title: start.input }"))
//!   .add_step(Step::call("chunker/chunk").with_id("chunking"));
//!
//! assert_eq!(pipeline.len(), 2);
//! ```

mod error;
mod expression;
mod pipeline;
mod step;

pub use error::DefinitionError;
pub use expression::normalize_expression;
pub use pipeline::Pipeline;
pub use step::Step;
