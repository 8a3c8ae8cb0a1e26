//! Error discriminants for header parsing, alpha scanning, and frame decode.

use snafu::Snafu;

/// The distinct error kinds a `qmage` decode path can raise.
///
/// All fallible entry points return `Result<_, Error>`; no error is
/// silently swallowed except for the inter sub-block "motion vector out of
/// range" case, which logs a [`log::warn!`] and leaves the block unchanged
/// instead of failing the whole frame.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Magic bytes at offset 0 were not `0x514D`.
    #[snafu(display("bad magic"))]
    BadMagic,

    /// `qversion` was neither `0xB` nor greater.
    #[snafu(display("unsupported qversion {qversion:#x}"))]
    UnsupportedVersion { qversion: u8 },

    /// A header field or encoder mode names a feature outside the core's
    /// scope (see `spec.md` §1 Non-goals).
    #[snafu(display("unsupported feature: {what}"))]
    UnsupportedFeature { what: &'static str },

    /// A length, offset, or derived position failed a range check.
    #[snafu(display("invalid stream: {why}"))]
    Invalid { why: &'static str },

    /// A reader ran past the end of the supplied packet bytes.
    #[snafu(display("unexpected end of stream"))]
    EndOfStream,

    /// An allocation needed to materialize a buffer could not be made.
    #[snafu(display("out of memory"))]
    OutOfMemory,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
