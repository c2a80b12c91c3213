pub mod error;
pub mod layer;
pub mod utils;

pub use error::{ConfstackError, LayerError, LoadError, LoadErrorKind, Result, ResultExt};
pub use layer::{Attempt, LayerDescriptor, LayerKind, LayerOutcome, LayerResult};
pub use utils::{
    PathSegment, format_seconds, get_path, json_non_empty_str, parse_path, pointer_to_data_path,
    set_path,
};
