// src/theses/order.rs
use std::cmp::Ordering;

use clap::ValueEnum;

use crate::theses::record::Record;

/// How records are ordered, and with it how the rendered page is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortPolicy {
    /// Author ascending, then year ascending. Navigation by alphabetic band.
    #[default]
    Author,
    /// Year descending, then author ascending. Navigation by year.
    Year,
}

/// Author bytes with only the first one upper-cased (ASCII).
/// The stored author is never modified.
pub fn author_key(author: &[u8]) -> impl Iterator<Item = u8> + '_ {
    let (first, rest) = match author.split_first() {
        Some((first, rest)) => (Some(first.to_ascii_uppercase()), rest),
        None => (None, author),
    };
    first.into_iter().chain(rest.iter().copied())
}

/// Upper-cased first byte of the author, used for band navigation.
pub fn author_initial(author: &[u8]) -> Option<u8> {
    author_key(author).next()
}

fn compare_authors(a: &Record, b: &Record) -> Ordering {
    author_key(&a.author).cmp(author_key(&b.author))
}

// Years are compared as bytes; "892" sorts after "2019".
fn compare_years(a: &Record, b: &Record) -> Ordering {
    a.year.cmp(&b.year)
}

impl SortPolicy {
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            SortPolicy::Author => compare_authors(a, b).then_with(|| compare_years(a, b)),
            SortPolicy::Year => compare_years(b, a).then_with(|| compare_authors(a, b)),
        }
    }

    /// Sorts the records in place.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
        tracing::debug!("Sorted {} records by {:?}", records.len(), self);
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortPolicy::Author => "author",
            SortPolicy::Year => "year",
        }
    }
}
