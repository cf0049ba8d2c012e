mod diagnose;
mod packer;

pub use diagnose::{diagnose_packed_lengths, PackDiagnostics};
pub use packer::{pack_to_fixed_blocks, FixedBlockPacker};

pub(crate) use diagnose::offending_length;
