use std::fmt;

use thiserror::Error;

/// One step of an attribute path: either a named attribute or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Attr(String),
    Index(usize),
}

/// A canonical path addressing an attribute inside a stored record, e.g.
/// `experience[0].responsibilities[1]`. Paths are built structurally and
/// rendered on demand; rendering is injective as long as attribute names
/// stay plain identifiers (ours are fixed constants).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrPath {
    segments: Vec<Segment>,
}

#[derive(Debug, Error, PartialEq)]
#[error("malformed attribute path '{0}'")]
pub struct PathParseError(String);

impl AttrPath {
    /// Starts a path at a top-level attribute.
    pub fn attr(name: &str) -> Self {
        Self {
            segments: vec![Segment::Attr(name.to_string())],
        }
    }

    /// Appends a list index: `collection[idx]`.
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(Segment::Index(idx));
        self
    }

    /// Appends a nested attribute name: `collection[idx].field`.
    pub fn field(mut self, name: &str) -> Self {
        self.segments.push(Segment::Attr(name.to_string()));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// The path with its final segment dropped; `None` for a bare attribute.
    pub fn parent(&self) -> Option<AttrPath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(AttrPath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Inverse of `Display`. Used by gateways that receive rendered paths
    /// through a patch's name table and need them back in structured form.
    pub fn parse(input: &str) -> Result<Self, PathParseError> {
        let mut segments = Vec::new();
        let mut rest = input;
        loop {
            let name_len = rest
                .find(|c| c == '[' || c == ']' || c == '.')
                .unwrap_or(rest.len());
            let (name, tail) = rest.split_at(name_len);
            if name.is_empty() {
                return Err(PathParseError(input.to_string()));
            }
            segments.push(Segment::Attr(name.to_string()));
            rest = tail;
            while let Some(tail) = rest.strip_prefix('[') {
                let end = tail
                    .find(']')
                    .ok_or_else(|| PathParseError(input.to_string()))?;
                let idx = tail[..end]
                    .parse::<usize>()
                    .map_err(|_| PathParseError(input.to_string()))?;
                segments.push(Segment::Index(idx));
                rest = &tail[end + 1..];
            }
            match rest.strip_prefix('.') {
                Some(tail) => rest = tail,
                None => break,
            }
        }
        if !rest.is_empty() {
            return Err(PathParseError(input.to_string()));
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Attr(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{name}")?;
                }
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_top_level_attribute() {
        assert_eq!(AttrPath::attr("email").to_string(), "email");
    }

    #[test]
    fn test_renders_list_element() {
        assert_eq!(
            AttrPath::attr("certifications").index(1).to_string(),
            "certifications[1]"
        );
    }

    #[test]
    fn test_renders_element_field() {
        assert_eq!(
            AttrPath::attr("degrees").index(0).field("major").to_string(),
            "degrees[0].major"
        );
    }

    #[test]
    fn test_renders_nested_list_element() {
        assert_eq!(
            AttrPath::attr("experience")
                .index(2)
                .field("responsibilities")
                .index(4)
                .to_string(),
            "experience[2].responsibilities[4]"
        );
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = AttrPath::attr("skills").index(3).field("name");
        let b = AttrPath::attr("skills").index(3).field("name");
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_tuples_render_distinctly() {
        let paths = [
            AttrPath::attr("skills"),
            AttrPath::attr("skills").index(0),
            AttrPath::attr("skills").index(1),
            AttrPath::attr("skills").index(0).field("name"),
            AttrPath::attr("skills").index(1).field("name"),
            AttrPath::attr("experience").index(0).field("responsibilities"),
            AttrPath::attr("experience")
                .index(0)
                .field("responsibilities")
                .index(0),
        ];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }

    #[test]
    fn test_parse_round_trips() {
        let paths = [
            "email",
            "certifications[1]",
            "degrees[0].major",
            "experience[2].responsibilities[4]",
        ];
        for raw in paths {
            let parsed = AttrPath::parse(raw).unwrap();
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for raw in ["", "[0]", "a[", "a[x]", "a[0", "a.", "a]b", "a[0]b"] {
            assert!(AttrPath::parse(raw).is_err(), "accepted '{raw}'");
        }
    }

    #[test]
    fn test_parent_drops_last_segment() {
        let path = AttrPath::attr("certifications").index(2);
        assert_eq!(path.parent().unwrap(), AttrPath::attr("certifications"));
        assert_eq!(AttrPath::attr("email").parent(), None);
    }
}
