//! IL-style hardware component layer.
//!
//! The camera source does not talk to hardware directly. It sequences calls
//! on [`IlComponent`]s created through an [`IlCore`]: state transitions,
//! port enable/flush/allocate, typed parameter and config get/set, buffer
//! acquire/release and tunnels between components.
//!
//! # Components and ports
//!
//! | Role | Ports |
//! |------|-------|
//! | [`ComponentRole::Camera`] | [`PortRole::CameraIn`], [`PortRole::CameraVideoOut`], [`PortRole::CameraPreviewOut`] |
//! | [`ComponentRole::NullSink`] | [`PortRole::NullSinkIn`] |
//! | [`ComponentRole::Encoder`] | [`PortRole::EncoderIn`], [`PortRole::EncoderOut`] |
//!
//! The null sink and encoder only exist on targets with the extended
//! capability set, see [`HardwareTarget`](crate::config::HardwareTarget).
//!
//! [`mock`] provides an in-memory implementation for tests.

mod component;
pub mod mock;
mod types;

pub use component::{IlComponent, IlCore, PortHandle};
pub use types::{
    Acquire, ColorFormat, ComponentState, CompressionFormat, Config, ConfigKey, IlBuffer,
    IlBufferFlags, Param, ParamKey, PortDefinition, PortDirection, PortRange, VideoPortDefinition,
    VideoPortFormat,
};

use std::fmt;
use thiserror::Error;

/// Result type for hardware component calls.
pub type IlResult<T> = std::result::Result<T, IlError>;

/// Error codes reported by the hardware component layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IlError {
    /// No more items at this index (end of an enumeration).
    #[error("no more items")]
    NoMore,

    /// The operation did not complete in time.
    #[error("timeout")]
    Timeout,

    /// The component ran out of resources.
    #[error("insufficient resources")]
    InsufficientResources,

    /// The call is not valid in the component's current state.
    #[error("incorrect state operation")]
    IncorrectStateOperation,

    /// The requested state transition is not allowed.
    #[error("incorrect state transition")]
    IncorrectStateTransition,

    /// A parameter value was rejected.
    #[error("bad parameter")]
    BadParameter,

    /// The parameter or config index is not supported.
    #[error("unsupported index")]
    UnsupportedIndex,

    /// The port index does not exist on the component.
    #[error("bad port index {0}")]
    BadPortIndex(u32),

    /// The component could not be created.
    #[error("component {0} not found")]
    ComponentNotFound(String),

    /// The tunnel could not be established.
    #[error("ports not compatible for tunneling")]
    PortsNotCompatible,

    /// Any other hardware-specific failure.
    #[error("hardware failure: {0}")]
    Hardware(String),
}

/// Component slots held by the camera source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentRole {
    /// The camera itself.
    Camera,
    /// Sink absorbing the unused preview stream.
    NullSink,
    /// Encoder chained after the camera video output.
    Encoder,
}

impl ComponentRole {
    /// All roles, in forward dependency order.
    pub const ALL: [ComponentRole; 3] = [Self::Camera, Self::NullSink, Self::Encoder];

    /// Slot index in the component table.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Camera => "camera",
            Self::NullSink => "null sink",
            Self::Encoder => "encoder",
        })
    }
}

/// Port slots held by the camera source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortRole {
    /// Camera input (clock/control) port.
    CameraIn,
    /// Camera video output port.
    CameraVideoOut,
    /// Camera preview output port.
    CameraPreviewOut,
    /// Null sink input port.
    NullSinkIn,
    /// Encoder input port.
    EncoderIn,
    /// Encoder output port.
    EncoderOut,
}

impl PortRole {
    /// All roles, in the order ports are enabled.
    pub const ALL: [PortRole; 6] = [
        Self::CameraIn,
        Self::CameraVideoOut,
        Self::CameraPreviewOut,
        Self::NullSinkIn,
        Self::EncoderIn,
        Self::EncoderOut,
    ];

    /// Slot index in the port table.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Component owning this port.
    pub const fn component(self) -> ComponentRole {
        match self {
            Self::CameraIn | Self::CameraVideoOut | Self::CameraPreviewOut => {
                ComponentRole::Camera
            }
            Self::NullSinkIn => ComponentRole::NullSink,
            Self::EncoderIn | Self::EncoderOut => ComponentRole::Encoder,
        }
    }
}

impl fmt::Display for PortRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CameraIn => "camera input",
            Self::CameraVideoOut => "camera video output",
            Self::CameraPreviewOut => "camera preview output",
            Self::NullSinkIn => "null sink input",
            Self::EncoderIn => "encoder input",
            Self::EncoderOut => "encoder output",
        })
    }
}
