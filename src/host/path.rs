use std::fmt;

/// Path to a nested host surface, e.g. `C_ClassTalents.GetActiveSpecOverride`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfacePath(Vec<String>);

impl SurfacePath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(segments.into_iter().map(|s| s.as_ref().to_string()).collect())
    }

    /// Parse dot notation. A leading `_G.` is accepted and dropped.
    pub fn parse(dotted: &str) -> Self {
        let normalized = dotted.trim();
        let normalized = normalized.strip_prefix("_G.").unwrap_or(normalized);
        if normalized.is_empty() {
            return Self(Vec::new());
        }
        Self(normalized.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no segment is empty and the path is non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|s| !s.is_empty())
    }
}

impl fmt::Display for SurfacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for SurfacePath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl From<String> for SurfacePath {
    fn from(dotted: String) -> Self {
        Self::parse(&dotted)
    }
}

impl From<Vec<String>> for SurfacePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl<S: AsRef<str>> From<&[S]> for SurfacePath {
    fn from(segments: &[S]) -> Self {
        Self::new(segments)
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for SurfacePath {
    fn from(segments: [S; N]) -> Self {
        Self::new(segments)
    }
}

impl<S: AsRef<str>, const N: usize> From<&[S; N]> for SurfacePath {
    fn from(segments: &[S; N]) -> Self {
        Self::new(segments)
    }
}

impl From<&SurfacePath> for SurfacePath {
    fn from(path: &SurfacePath) -> Self {
        path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted() {
        let path = SurfacePath::parse("C_ClassTalents.GetActiveSpecOverride");
        assert_eq!(path.segments(), ["C_ClassTalents", "GetActiveSpecOverride"]);
        assert_eq!(SurfacePath::parse("_G.C_Spell"), SurfacePath::from(["C_Spell"]));
        assert!(SurfacePath::parse("  ").is_empty());
    }

    #[test]
    fn test_well_formed() {
        assert!(SurfacePath::from("A.B").is_well_formed());
        assert!(!SurfacePath::from("A..B").is_well_formed());
        assert!(!SurfacePath::new(Vec::<String>::new()).is_well_formed());
    }
}
