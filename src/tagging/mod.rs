//! Release tagging: prerelease numbering plus bare and smart tags.

mod backend;
mod prerelease;

pub use backend::{GitTagBackend, TagBackend};
pub use prerelease::{Prerelease, PrereleaseKind, next_sequence, parse_sequence, tag_glob};
