//! Filesystem operations: extension discovery, single-file moves and tree relocation.

mod extensions;
mod file_move;
mod helpers;
mod io_copy;
mod metadata;
mod relocate;
mod space;
mod util;

pub use extensions::{
    ExtensionSet, file_extension, match_allowlist, normalize_extension, scan_extensions,
};
pub use file_move::{MoveOutcome, copy_then_remove, move_file};
pub use helpers::{io_error_with_help, io_hint};
pub use relocate::{
    DestinationLayout, ExclusionSet, PlannedMove, RelocationReport, plan_relocation, relocate_tree,
};
