use crate::settings::ResolvedSettings;
use crate::tags::Tag;
use std::collections::BTreeSet;
use tracefix_types::dst::{FuncDecl, Receiver, TypeDecl};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Include,
    Skip,
}

impl Verdict {
    pub fn should_skip(self) -> bool {
        matches!(self, Verdict::Skip)
    }
}

/// Per-package type tag state. `enable` always wins over `skip`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeTags {
    skip: BTreeSet<String>,
    enable: BTreeSet<String>,
}

impl TypeTags {
    /// Scans type declarations across every file of a package.
    pub fn scan<'a>(
        settings: &ResolvedSettings,
        types: impl IntoIterator<Item = &'a TypeDecl>,
    ) -> Self {
        let mut out = TypeTags::default();
        for ty in types {
            match Tag::from_comments(&ty.decs.start) {
                Tag::ForceInclude => {
                    out.enable.insert(ty.name.clone());
                }
                Tag::ForceSkip => {
                    out.skip.insert(ty.name.clone());
                }
                Tag::Unspecified => {
                    if settings.skip_by_name(&ty.name) || settings.tagged() {
                        out.skip.insert(ty.name.clone());
                    }
                }
            }
        }
        out.skip.retain(|name| !out.enable.contains(name));
        out
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enable.contains(name)
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        !self.is_enabled(name) && self.skip.contains(name)
    }
}

/// What the resolver needs to know about one function declaration.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub tag: Tag,
    pub receiver: Option<&'a Receiver>,
}

impl<'a> Candidate<'a> {
    pub fn from_func(func: &'a FuncDecl) -> Self {
        Self {
            name: &func.name,
            tag: Tag::from_comments(&func.decs.start),
            receiver: func.recv.as_ref(),
        }
    }
}

/// Decides whether `candidate` is instrumented.
///
/// An inline `trace:enable` always includes. A receiver type tagged `trace:enable` includes
/// its methods unless the method itself carries `trace:skip`.
pub fn decide(settings: &ResolvedSettings, candidate: &Candidate<'_>, types: &TypeTags) -> Verdict {
    if candidate.tag == Tag::ForceInclude {
        return Verdict::Include;
    }

    let type_name = candidate.receiver.and_then(Receiver::type_name);
    if type_name.is_some_and(|t| types.is_enabled(t)) && candidate.tag != Tag::ForceSkip {
        return Verdict::Include;
    }

    if settings.skip_by_name(candidate.name) || candidate.tag == Tag::ForceSkip {
        return Verdict::Skip;
    }

    match candidate.receiver {
        Some(recv) => {
            let Some(type_name) = type_name else {
                warn!(func = candidate.name, receiver = ?recv.ty, "unrecognized receiver type, skipping");
                return Verdict::Skip;
            };
            if types.is_skipped(type_name) {
                debug!(func = candidate.name, type_name, "receiver type is skipped");
                return Verdict::Skip;
            }
        }
        None if settings.methods() => return Verdict::Skip,
        None => {}
    }

    if settings.tagged() {
        return Verdict::Skip;
    }
    Verdict::Include
}
