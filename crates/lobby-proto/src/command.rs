//! Keyword/argument splitting for decoded lines.

/// A command line split into its keyword and argument tokens.
///
/// The keyword is upper-cased; tokens borrow from the original line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine<'a> {
    /// Upper-cased command keyword.
    pub keyword: String,
    /// Whitespace-separated argument tokens, in order.
    pub tokens: Vec<&'a str>,
}

impl<'a> CommandLine<'a> {
    /// Split a line into keyword and tokens.
    ///
    /// Returns `None` for lines that contain only whitespace.
    pub fn split(line: &'a str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let keyword = words.next()?.to_ascii_uppercase();
        Some(Self {
            keyword,
            tokens: words.collect(),
        })
    }
}
