//! fitgen - resilient generative-AI access for a fitness planner
//!
//! The crate decides which upstream models to call and in which order
//! ([`resolver`]), walks those candidates with classified fallback
//! ([`invoker`]), memoizes image lookups durably ([`cache`]) and repairs
//! near-JSON model output ([`repair`]). [`service::Assistant`] ties these
//! together per request; the `server` feature exposes it over HTTP.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fitgen::providers::GeminiClient;
//! use fitgen::service::Assistant;
//! use fitgen::types::FitnessProfile;
//!
//! #[tokio::main]
//! async fn main() -> fitgen::Result<()> {
//!     let gemini = Arc::new(GeminiClient::new("your-gemini-key")?);
//!     let assistant = Assistant::builder()
//!         .catalog(gemini.clone())
//!         .text(gemini)
//!         .build();
//!
//!     let profile: FitnessProfile = serde_json::from_str(
//!         r#"{"age": 34, "height_cm": 180, "weight_kg": 82, "goal": "lose fat"}"#,
//!     )?;
//!     let plan = assistant.generate_plan(&profile).await?;
//!     for day in &plan.workout {
//!         println!("{}: {} exercises", day.day, day.exercises.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod classify;
pub mod error;
pub mod invoker;
pub mod providers;
pub mod repair;
pub mod resolver;
#[cfg(feature = "server")]
pub mod server;
pub mod service;
pub mod telemetry;
pub mod types;
pub mod version;

pub use error::{ErrorKind, FitgenError, Result};
pub use version::{PKG_VERSION, version_string};
