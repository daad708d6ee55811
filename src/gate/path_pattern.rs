use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathPatternError {
    #[error("path pattern is empty")]
    Empty,
    #[error("path pattern must start with '/': {0}")]
    NotAbsolute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`: zero or more whole segments.
    AnyDepth,
    /// Literal text, optionally with `*` (any run within the segment) and `?`.
    Glob(String),
}

/// Ant-style request path pattern, e.g. `/actuator/health/**` or `/static/*.css`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Result<Self, PathPatternError> {
        let raw = pattern.trim();
        if raw.is_empty() {
            return Err(PathPatternError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PathPatternError::NotAbsolute(raw.to_string()));
        }

        let segments = split_path(raw)
            .map(|segment| match segment {
                "**" => Segment::AnyDepth,
                other => Segment::Glob(other.to_string()),
            })
            .collect();

        Ok(PathPattern {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &path)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((head, tail)) => glob_matches(glob, head) && match_segments(rest, tail),
            None => false,
        },
    }
}

fn glob_matches(glob: &str, text: &str) -> bool {
    let glob: Vec<char> = glob.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut g, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(g) {
            Some('*') => {
                backtrack = Some((g, t));
                g += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    g = star + 1;
                    t = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }

    glob[g..].iter().all(|&c| c == '*')
}
