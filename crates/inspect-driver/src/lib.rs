//! # Inspect Driver
//!
//! Test driver over the inspection engine. Register plugins, open a capture
//! file or a plugin source, iterate events and extract fields together with
//! the byte range of the event data they came from.
//!
//! ```no_run
//! use inspect_driver::{Driver, Status};
//!
//! # fn main() -> inspect_driver::Result<()> {
//! let mut driver = Driver::new()?;
//! driver.open_capture_file("trace.cap")?;
//! loop {
//!     let (status, event) = driver.next();
//!     if status != Status::Ok {
//!         break;
//!     }
//!     let (value, start, len) = driver.extract_field_with_offsets("evt.arg[fd]", &event)?;
//!     println!("fd={} at {}+{}", value, start, len);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! All drivers in a process share one lock; operations on different
//! drivers never overlap.

#![warn(missing_docs)]

pub mod driver;
pub mod error;
pub mod extractors;
mod lock;
pub mod logging;
pub mod metrics;

pub use driver::{CaptureState, Driver, EventHandle};
pub use error::{Error, Result};
pub use inspect_config::DriverConfig;
pub use inspect_engine::{PluginDescriptor, PluginHandle, Status};
pub use metrics::Metric;
