//! Wire protocol
//!
//! The relay speaks newline-delimited JSON: every message is a single JSON
//! document terminated by `\n`. The first frame on a connection must be a
//! [`Registration`]; everything after it is an opaque application payload
//! that the server forwards verbatim to the sender's VLAN.

pub mod codec;
pub mod message;

pub use codec::{decode, encode, read_frame, write_frame, DEFAULT_MAX_FRAME_LEN};
pub use message::Registration;
