//! Security 2 extension codec.
//!
//! Extensions are TLV sub-frames carried inside the Security 2 message
//! encapsulation, before and after the encrypted boundary. This crate reads
//! and writes extension chains and applies the acceptance rules:
//!
//! - an extension that cannot be interpreted is dropped on its own;
//! - an unknown extension marked critical discards the whole command;
//! - the multicast key state (MPAN) is only accepted from the decrypted
//!   section, everything else only from the unencrypted section.
//!
//! ```rust
//! use zwave_s2::{decode_chain, encode_chain, validate_chain, ChainVerdict, Security2Extension};
//!
//! let wire = encode_chain(&[Security2Extension::Mgrp { group_id: 3 }, Security2Extension::Mos]);
//! let (raws, _) = decode_chain(&wire).unwrap();
//! assert_eq!(
//!     validate_chain(&raws, false),
//!     ChainVerdict::Accepted(vec![Security2Extension::Mgrp { group_id: 3 }, Security2Extension::Mos])
//! );
//! ```

mod chain;
mod error;
mod extension;
mod validate;

pub use chain::*;
pub use error::*;
pub use extension::*;
pub use validate::*;
