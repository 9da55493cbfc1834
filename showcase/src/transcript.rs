//! Ordered line sink shared by all scenarios
//!
//! Every line a scenario reports goes through a `Transcript`. Lines are kept
//! in order so tests can assert on them, and optionally echoed to stdout.

/// Ordered, append-only record of scenario output
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<String>,
    echo: bool,
}

impl Transcript {
    /// Create a transcript that only records lines
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn with_echo(echo: bool) -> Self {
        Self {
            lines: Vec::new(),
            echo,
        }
    }

    /// Append a line
    pub fn line(&mut self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{}", line);
        }
        self.lines.push(line);
    }

    /// Append an empty line followed by a section heading
    pub fn section(&mut self, heading: impl AsRef<str>) {
        self.line("");
        self.line(format!("--- {} ---", heading.as_ref()));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any recorded line contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    /// Index of the first line containing `needle`
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.contains(needle))
    }
}
