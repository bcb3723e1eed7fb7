use regex::Regex;
use std::sync::LazyLock;
use tracefix_types::tags;

static SKIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"//\s*{}", tags::SKIP)).expect("skip tag pattern"));
static ENABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"//\s*{}", tags::ENABLE)).expect("enable tag pattern"));

/// Tag state of one declaration, read from its leading comment group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    ForceInclude,
    ForceSkip,
    Unspecified,
}

impl Tag {
    /// `trace:enable` wins when both tags are present.
    pub fn from_comments(comments: &[String]) -> Tag {
        if comments.iter().any(|c| ENABLE.is_match(c)) {
            Tag::ForceInclude
        } else if comments.iter().any(|c| SKIP.is_match(c)) {
            Tag::ForceSkip
        } else {
            Tag::Unspecified
        }
    }
}
