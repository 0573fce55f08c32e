//! Probes for the external collaborators of a FlowState server check:
//! the HTTP API and the local camera.

pub mod camera;
pub mod client;

pub use camera::{open_camera, CameraProbe, CameraReport, FrameShape, FrameSource};
pub use client::{AnalyticsFetch, DiagClient, PoseBody, PoseProbe};
