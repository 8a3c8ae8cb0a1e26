//! W2_PASS still-image decoders (`spec.md` §4.F/§4.G).

pub mod depth1;

#[cfg(feature = "alloc")]
pub mod depth2;
