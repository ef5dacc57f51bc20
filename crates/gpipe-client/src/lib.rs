//! gpipe Client
//!
//! Submits pipeline definitions to the orchestrator with a single
//! `POST {base_url}/api/jobs` and returns the parsed response. The client
//! encodes the pipeline as given, attaches a bearer key when one is
//! configured, and reports every failure to the caller. It never retries.
//!
//! ```no_run
//! # async fn example() -> Result<(), gpipe_client::ClientError> {
//! use gpipe_client::Client;
//! use gpipe_definition::{Pipeline, Step};
//!
//! let client = Client::new("https://orchestrator.example", Some("secret"))?;
//!
//! let mut pipeline = Pipeline::new().with_input("Dolomiti");
//! pipeline.add_step(Step::call("wikipedia/it").with_xin("{ title: start.input }"));
//!
//! let response = client.run(&pipeline).await?;
//! println!("{:?}", response);
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use gpipe_encoding::WireFormat;
