//! # Events Module
//!
//! Progress reporting for pipeline runs.
//!
//! The walker and every worker send events through a shared channel, so a
//! UI (the CLI progress bar, or anything embedding the library) can follow a
//! run without the core knowing how it is displayed.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Worker(WorkerEvent::Processed(p)) = event {
//!             eprintln!("{} done", p.completed);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&task, &sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
