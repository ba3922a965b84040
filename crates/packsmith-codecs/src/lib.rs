//! Packsmith-Codecs: external tool invocation layer.
//!
//! Everything that shells out lives here: tool discovery, the async command
//! runner with timeout and cancellation, the staging workspace, and the
//! concrete codec/archiver invocations (cjxl, realesrgan-ncnn-vulkan, ffmpeg,
//! 7z). The pipeline core never builds a `Command` itself.

pub mod command;
pub mod compress;
pub mod encode;
pub mod error;
pub mod probe;
pub mod staging;
pub mod tools;
pub mod transcode;
pub mod upscale;

pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use staging::StagingArea;
pub use tools::{check_tool, check_tools, require_tool, ToolInfo, Toolchain};
