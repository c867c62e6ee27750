//! Protocol definitions for Yacode communication.
//!
//! This module contains the low-level protocol types including:
//! - Command kinds
//! - Frame encoding/decoding
//! - Protocol messages and request builders
//! - Reply parsing

pub mod command;
pub mod frame;
pub mod message;
pub mod parser;

pub use command::CommandKind;
pub use frame::{FRAME_END, FRAME_START, MIN_FRAME_SIZE, decode, decode_frame, encode};
pub use message::ProtocolMessage;
pub use parser::parse_template_names;
