//! Context resolution: from a merge event to a [`ReleaseContext`].

mod event;
mod resolver;

pub use event::MergeEvent;
pub use resolver::{
    ContextResolver, Phase, ReleaseContext, extract_version, find_intent, infer_phase,
};
