//! Directory-layout and filename grammars for raw test-bench output
//!
//! Raw results live at `<data_root>/<module>/<kind>/<pattern>/<temp>C/<file>`
//! and the file stem carries kind-specific parameters separated by `_`.
//! [`PathGrammar`] maps path segments to roles; [`decode_filename`] maps
//! stem tokens to a typed [`FilenameParameters`] variant.

mod filename;
mod path;

pub use filename::{decode_filename, layout, DecodedFilename, Field, FieldType, FilenameParameters};
pub use path::{DecodedPath, PathGrammar, SegmentRole, DEFAULT_ANCHORS};
