use std::fmt;

/// Dotted address into the dataset, e.g. `cars.mpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn new<S: AsRef<str>>(dotted: S) -> Self {
        Self {
            segments: dotted
                .as_ref()
                .split('.')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(Path::new(segment).segments);
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self { segments: rest.to_vec() })
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl std::str::FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Path::new(s))
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::new(s)
    }
}

#[cfg(test)]
mod test_path {
    use super::*;

    #[test]
    fn test_dotted() {
        let path = Path::new("cars.mpg");
        assert_eq!(path.segments(), ["cars", "mpg"]);
        assert_eq!(path.to_string(), "cars.mpg");
        assert_eq!(path.last(), Some("mpg"));
        assert_eq!(path.parent(), Some(Path::new("cars")));
        assert_eq!(Path::new("cars").join("origin.name"), Path::new("cars.origin.name"));
    }

    #[test]
    fn test_root() {
        assert!(Path::new("").is_root());
        assert!(Path::new(" . ").is_root());
        assert_eq!(Path::root().parent(), None);
    }
}
