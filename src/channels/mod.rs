//! Small latest-value channels: camera and window resolution

pub mod camera;
pub mod resolution;

pub use camera::{CameraReader, CameraState, CameraWriter};
pub use resolution::{
    Resolution, ResolutionReader, ResolutionSide, ResolutionState, ResolutionWriter,
};
