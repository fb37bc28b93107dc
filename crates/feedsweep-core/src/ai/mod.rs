pub mod providers;
mod topic;

pub use providers::{build_provider, Completion, TokenUsage, TopicProvider};
pub use topic::{
    parse_response, Pricing, SkipReason, TopicCandidate, TopicFilter, TopicFilterError,
    TopicOutcome, TopicTextField,
};
