//! GLSL source preparation.
//!
//! Two rewrites happen before naga sees a GLSL stage:
//! - a missing `#version` directive is inserted
//! - loose `uniform <float|vec2|vec3|vec4|int> name;` declarations are
//!   collected into one uniform block per stage, since Vulkan-flavored GLSL
//!   only accepts uniforms inside blocks
//!
//! All inserted text sits in one contiguous run and loose declarations are
//! blanked in place, so diagnostics can be mapped back to the caller's text.

use std::borrow::Cow;
use std::ops::Range;

use naga::{Span, WithSpan};

use super::StageKind;

/// Version directive inserted into GLSL sources that do not declare one.
pub const DEFAULT_GLSL_VERSION: &str = "#version 450";

const LOOSE_TYPES: [&str; 5] = ["float", "vec2", "vec3", "vec4", "int"];
const PRECISIONS: [&str; 3] = ["lowp", "mediump", "highp"];

/// Binding (in group 0) of the block holding a stage's loose uniforms.
pub const fn loose_uniform_binding(kind: StageKind) -> u32 {
    match kind {
        StageKind::Vertex => 14,
        StageKind::Fragment => 15,
    }
}

fn loose_block_name(kind: StageKind) -> &'static str {
    match kind {
        StageKind::Vertex => "NabuVertexUniforms",
        StageKind::Fragment => "NabuFragmentUniforms",
    }
}

/// A GLSL stage ready for the naga front-end.
#[derive(Debug)]
pub(crate) struct GlslSource<'a> {
    text: Cow<'a, str>,
    /// Offset, in the caller's text, where generated text was inserted.
    inserted_at: usize,
    inserted_len: usize,
}

impl<'a> GlslSource<'a> {
    pub(crate) fn prepare(source: &'a str, kind: StageKind) -> Self {
        let loose = LooseUniforms::gather(source);

        let mut insert = String::new();
        let at = match version_line_end(source) {
            Some(end) => {
                if end == source.len() && !source.ends_with('\n') && !loose.members.is_empty() {
                    insert.push('\n');
                }
                end
            }
            None => {
                insert.push_str(DEFAULT_GLSL_VERSION);
                insert.push('\n');
                0
            }
        };

        if !loose.members.is_empty() {
            insert.push_str(&loose.block(kind));
            insert.push('\n');
        }

        if insert.is_empty() {
            return Self {
                text: Cow::Borrowed(source),
                inserted_at: 0,
                inserted_len: 0,
            };
        }

        let mut text = source.to_owned();
        for range in &loose.declarations {
            text.replace_range(range.clone(), &" ".repeat(range.len()));
        }
        text.insert_str(at, &insert);

        Self {
            text: Cow::Owned(text),
            inserted_at: at,
            inserted_len: insert.len(),
        }
    }

    /// Text handed to the front-end.
    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Maps a span of [`Self::text`] onto the caller's source.
    ///
    /// Spans touching generated text become undefined.
    pub(crate) fn original_span(&self, span: Span) -> Span {
        let Some(range) = span.to_range() else {
            return span;
        };

        let (at, len) = (self.inserted_at, self.inserted_len);
        let start = match range.start {
            pos if pos < at => Some(pos),
            pos if pos >= at + len => Some(pos - len),
            _ => None,
        };
        let end = match range.end {
            pos if pos <= at => Some(pos),
            pos if pos >= at + len => Some(pos - len),
            _ => None,
        };

        match (start, end) {
            (Some(start), Some(end)) => Span::new(start as u32, end as u32),
            _ => Span::UNDEFINED,
        }
    }

    /// Rewrites every span of a validation error with [`Self::original_span`].
    pub(crate) fn remap<E>(&self, err: WithSpan<E>) -> WithSpan<E> {
        let spans: Vec<(Span, String)> = err
            .spans()
            .map(|(span, label)| (self.original_span(*span), label.clone()))
            .collect();

        spans
            .into_iter()
            .fold(WithSpan::new(err.into_inner()), |acc, (span, label)| {
                acc.with_span(span, label)
            })
    }

    #[cfg(test)]
    fn is_rewritten(&self) -> bool {
        matches!(self.text, Cow::Owned(_))
    }
}

/// Byte offset just past the `#version` line, if any.
fn version_line_end(source: &str) -> Option<usize> {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        if line.trim_start().starts_with("#version") {
            return Some(offset + line.len());
        }
        offset += line.len();
    }
    None
}

#[derive(Debug, Default)]
struct LooseUniforms {
    /// `(type, name)` in declaration order, first declaration wins.
    members: Vec<(String, String)>,
    /// Byte ranges of the declarations in the caller's text.
    declarations: Vec<Range<usize>>,
}

impl LooseUniforms {
    fn gather(source: &str) -> Self {
        let mut loose = Self::default();
        let mut offset = 0;

        for line in source.split_inclusive('\n') {
            if let Some((range, ty, names)) = parse_loose_uniform(line) {
                for name in names {
                    if !loose.members.iter().any(|(_, n)| n == name) {
                        loose.members.push((ty.to_owned(), name.to_owned()));
                    }
                }
                loose
                    .declarations
                    .push(offset + range.start..offset + range.end);
            }
            offset += line.len();
        }

        loose
    }

    /// Single-line block declaration.
    fn block(&self, kind: StageKind) -> String {
        let members: String = self
            .members
            .iter()
            .map(|(ty, name)| format!(" {ty} {name};"))
            .collect();

        format!(
            "layout(set = 0, binding = {}) uniform {} {{{members} }};",
            loose_uniform_binding(kind),
            loose_block_name(kind),
        )
    }
}

/// Matches `uniform [precision] <type> a[, b...];` at the start of `line`.
fn parse_loose_uniform(line: &str) -> Option<(Range<usize>, &str, Vec<&str>)> {
    let start = line.len() - line.trim_start().len();
    let rest = &line[start..];
    let semi = rest.find(';')?;

    let decl = rest[..semi].strip_prefix("uniform")?;
    if !decl.starts_with(char::is_whitespace) {
        return None;
    }
    let decl = decl.trim_start();
    let decl = PRECISIONS
        .iter()
        .find_map(|p| {
            decl.strip_prefix(*p)
                .filter(|r| r.starts_with(char::is_whitespace))
        })
        .map_or(decl, str::trim_start);

    let (ty, names) = decl.split_once(char::is_whitespace)?;
    if !LOOSE_TYPES.contains(&ty) {
        return None;
    }

    let names: Vec<&str> = names.split(',').map(str::trim).collect();
    if !names.iter().all(|n| is_identifier(n)) {
        return None;
    }

    Some((start..start + semi + 1, ty, names))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
