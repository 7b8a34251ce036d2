//! IO modules - side effects (network, archive decoding)

pub mod download;
pub mod extract;
