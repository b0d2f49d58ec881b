//! Dotted field paths and their ancestor chains.
//!
//! A path with k dots has exactly k+1 ancestors, ordered by strictly
//! increasing length, the last one being the path itself. Empty segments are
//! kept (`"first."` yields `["first", "first."]`).

/// Positional-match segment used by projections (`"arr.$"`).
pub const POSITIONAL: &str = "$";

/// Split `path` into its ordered ancestor-prefix chain.
pub fn decompose(path: &str) -> Vec<String> {
    ancestors(path).map(str::to_string).collect()
}

/// Borrowing form of [`decompose`].
pub fn ancestors(path: &str) -> Ancestors<'_> {
    Ancestors { path, pos: 0, done: false }
}

pub struct Ancestors<'a> {
    path: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        match self.path[self.pos..].find('.') {
            Some(off) => {
                let end = self.pos + off;
                self.pos = end + 1;
                Some(&self.path[..end])
            }
            None => {
                self.done = true;
                Some(self.path)
            }
        }
    }
}

/// The part of `path` below `ancestor`, if `ancestor` is a proper prefix.
///
/// `relative_suffix("a.b", "a.b.c.d") == Some("c.d")`.
pub fn relative_suffix<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    path.strip_prefix(ancestor)?.strip_prefix('.')
}

/// Array-position spelling of a path, as used by positional projections.
pub fn positional(path: &str) -> String {
    format!("{}.{}", path, POSITIONAL)
}
