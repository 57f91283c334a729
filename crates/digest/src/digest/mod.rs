//! Digest assembly and delivery.
//!
//! - [`DigestInput`]: the four gathered sections plus the recipient's name
//! - [`compose`]: plain + HTML message envelope
//! - [`EmailSender`]: single-shot delivery through the Gmail API

mod compose;
mod input;
mod sender;

pub use compose::{compose, subject_for, DigestMessage, FOOTER};
pub use input::DigestInput;
pub use sender::{encode_raw, DeliveryReceipt, EmailSender};
