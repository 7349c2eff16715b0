//! HTTP attacker for majin
//!
//! Issues the hits of each attack as HTTP/1.1 requests over plain TCP, paced
//! evenly across the attack window. One connection per hit.

pub mod attacker;
pub mod request;
pub mod response;

pub use attacker::{HttpAttacker, HttpAttackerConfig};
pub use request::{encode_request, EncodedRequest};
pub use response::{parse_head, ResponseHead};
