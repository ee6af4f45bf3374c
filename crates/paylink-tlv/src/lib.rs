//! Nested tag-length-value codec.
//!
//! Tags are 1 to 3 bytes with BER continuation, lengths use the short form up
//! to 127 and the long form above. Constructed nodes hold an ordered sequence
//! of child nodes; primitive nodes hold raw bytes.
//!
//! [`decode`] and [`encode`] are exact inverses for well-formed node
//! sequences. Tags missing from the [`tags`] table still decode; they just
//! have no symbolic name.

pub mod bcd;
pub mod codec;
pub mod error;
pub mod node;
pub mod tag;
pub mod tags;

pub use codec::{decode, encode, encode_into, MAX_DEPTH};
pub use error::{BcdError, Result, TlvError};
pub use node::{find, TlvNode, TlvValue};
pub use tag::{Tag, TagClass};
pub use tags::{lookup, TagInfo};
