//! # omxcamsrc
//!
//! A live video source for OpenMAX IL style camera hardware.
//!
//! The source opens a camera component (plus a null sink and a video
//! encoder on targets that chain them), negotiates an output format with
//! the pipeline, brings the capture chain to Executing and reassembles the
//! sliced hardware buffers into whole frames.
//!
//! ## Features
//!
//! - **Format catalog**: hardware port formats probed once and mapped to
//!   capability templates
//! - **Explicit negotiation**: query, fixate and commit as a checked state
//!   machine
//! - **Ordered capture bring-up**: tunnels, state transitions and buffer
//!   setup in a fixed dependency order with bounded waits
//! - **Fragment reassembly**: stride-padded slices copied into the frame
//!   geometry, damaged frames zeroed and flagged
//! - **Hardware targets**: one code path for generic and Raspberry Pi
//!   camera stacks, selected at runtime
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use omxcamsrc::prelude::*;
//!
//! let src = CameraSrc::new("camsrc0", core, SourceSettings::raspberry_pi());
//! src.start()?;
//! let caps = src.fixate(src.get_caps(None))?;
//! src.set_caps(&caps)?;
//! src.change_state(StateChange::PausedToPlaying, || Ok(()))?;
//!
//! let allocation = src.decide_allocation(None)?;
//! let mut buffer = Buffer::new(allocation.size);
//! if src.fill(&mut buffer)? == Flow::Filled {
//!     push_downstream(buffer);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod il;
pub mod metadata;
pub mod observability;
pub mod video_info;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::buffer::Buffer;
    pub use crate::camera::{Allocation, CameraSrc, Flow, NegotiationPhase, StateChange};
    pub use crate::clock::ClockTime;
    pub use crate::config::{CameraConfiguration, ComponentConfig, HardwareTarget, SourceSettings};
    pub use crate::error::{Error, Result};
    pub use crate::format::{Caps, Framerate, VideoCaps};
    pub use crate::il::{IlComponent, IlCore};
    pub use crate::metadata::Metadata;
}

pub use camera::CameraSrc;
pub use error::{Error, Result};
