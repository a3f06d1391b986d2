//! Auto-link rewriting of article bodies.
//!
//! Every occurrence of a known article title in a body is annotated with the
//! target slug: `Go Routines are fun` becomes
//! `Go Routines (go-routines) are fun`. Matching is case-insensitive, limited
//! to whole words and longest title first. The original casing of the body is
//! kept.
//!
//! Matched text together with its annotation is protected: later (shorter)
//! titles never match inside it. An occurrence that is already followed by
//! its annotation is recognized and left as is, so linking the output again
//! yields the same text.

use std::collections::BTreeMap;
use std::ops::Range;

use regex::Regex;

struct TitleEntry {
    title: String,
    slug: String,
    pattern: Regex,
}

impl TitleEntry {
    fn annotation(&self) -> String {
        format!(" ({})", self.slug)
    }
}

/// Title dictionary compiled for linking.
pub struct TitleIndex {
    entries: Vec<TitleEntry>,
}

impl TitleIndex {
    /// Build the index from `(title, slug)` pairs.
    ///
    /// Titles are keyed case-insensitively; when two articles share a title
    /// the lexicographically smallest slug wins. Entries are ordered by title
    /// length (in characters) descending, then by title.
    pub fn new<I>(titles: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut dictionary: BTreeMap<String, String> = BTreeMap::new();
        for (title, slug) in titles {
            let key = title.trim().to_lowercase();
            if key.is_empty() || slug.is_empty() {
                continue;
            }
            match dictionary.get(&key) {
                Some(existing) if existing <= &slug => {}
                _ => {
                    dictionary.insert(key, slug);
                }
            }
        }

        let mut entries: Vec<TitleEntry> = dictionary
            .into_iter()
            .filter_map(|(title, slug)| {
                match Regex::new(&format!("(?i){}", regex::escape(&title))) {
                    Ok(pattern) => Some(TitleEntry {
                        title,
                        slug,
                        pattern,
                    }),
                    Err(e) => {
                        tracing::warn!(title = %title, error = %e, "Skipping unlinkable title");
                        None
                    }
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.title
                .chars()
                .count()
                .cmp(&a.title.chars().count())
                .then_with(|| a.title.cmp(&b.title))
        });

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite `body`, never linking to `current_slug`.
    pub fn link(&self, body: &str, current_slug: &str) -> String {
        let mut doc = Rewrite::new(body);
        let active = self.entries.iter().filter(|e| e.slug != current_slug);

        // Existing annotations are claimed before anything new is inserted.
        for entry in active.clone() {
            doc.scan(entry, false);
        }
        for entry in active {
            doc.scan(entry, true);
        }

        doc.text
    }
}

/// Convenience wrapper for one-off rewrites.
pub fn auto_link<I>(body: &str, titles: I, current_slug: &str) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    TitleIndex::new(titles).link(body, current_slug)
}

/// Text being rewritten plus the byte ranges already claimed by a link.
struct Rewrite {
    text: String,
    protected: Vec<Range<usize>>,
}

impl Rewrite {
    fn new(body: &str) -> Self {
        Self {
            text: body.to_string(),
            protected: Vec::new(),
        }
    }

    fn is_free(&self, range: &Range<usize>) -> bool {
        !self
            .protected
            .iter()
            .any(|p| p.start < range.end && range.start < p.end)
    }

    fn is_whole_word(&self, range: &Range<usize>) -> bool {
        let before = self.text[..range.start].chars().next_back();
        let after = self.text[range.end..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    }

    /// Find every free whole-word occurrence of the entry's title.
    fn occurrences(&self, entry: &TitleEntry) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut start = 0;
        while start <= self.text.len() {
            let Some(m) = entry.pattern.find_at(&self.text, start) else {
                break;
            };
            let range = m.range();
            if range.is_empty() {
                break;
            }
            if self.is_whole_word(&range) && self.is_free(&range) {
                start = range.end;
                found.push(range);
            } else {
                // Retry one character further so overlapping candidates are not lost.
                let step = self.text[range.start..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                start = range.start + step;
            }
        }
        found
    }

    fn scan(&mut self, entry: &TitleEntry, insert: bool) {
        let annotation = entry.annotation();

        // Back to front so earlier offsets stay valid while inserting.
        for range in self.occurrences(entry).into_iter().rev() {
            let end = range.end + annotation.len();
            if self.text[range.end..].starts_with(&annotation) {
                self.protect(range.start..end);
            } else if insert {
                self.text.insert_str(range.end, &annotation);
                for p in self.protected.iter_mut() {
                    if p.start >= range.end {
                        p.start += annotation.len();
                        p.end += annotation.len();
                    }
                }
                self.protect(range.start..end);
            }
        }
    }

    fn protect(&mut self, range: Range<usize>) {
        self.protected.push(range);
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
