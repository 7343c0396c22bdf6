use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cover and thumbnail URLs for a book, as exchanged with the cover search function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverUrls {
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl CoverUrls {
    pub fn new(cover_url: impl Into<String>, thumbnail_url: Option<String>) -> Self {
        Self {
            cover_url: Some(cover_url.into()),
            thumbnail_url,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A result counts as found only when it carries a non-blank cover URL.
    pub fn has_cover(&self) -> bool {
        self.cover_url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Jpg,
    Png,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "png" => Ok(Self::Png),
            other => Err(format!("unsupported file type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverSearchAttempt {
    pub query: String,
    pub file_type: FileType,
}

/// What we know about the book whose cover is wanted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub isbn: Option<String>,
    pub title: String,
    pub author: Option<String>,
}

impl BookQuery {
    pub fn new(isbn: Option<&str>, title: &str, author: Option<&str>) -> Self {
        Self {
            isbn: non_blank(isbn),
            title: title.trim().to_string(),
            author: non_blank(author),
        }
    }

    /// ISBN with separators removed, as the metadata catalogs expect it.
    pub fn normalized_isbn(&self) -> Option<String> {
        self.isbn
            .as_deref()
            .map(|isbn| {
                isbn.chars()
                    .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
                    .collect::<String>()
            })
            .filter(|isbn| !isbn.is_empty())
    }

    /// Paid search queries from most to least specific.
    pub fn search_queries(&self) -> Vec<String> {
        if self.title.is_empty() && self.isbn.is_none() {
            return Vec::new();
        }

        let title = self.title.as_str();
        let author = self.author.as_deref().unwrap_or_default();
        let isbn = self.isbn.as_deref().unwrap_or_default();
        let quoted_title = if title.is_empty() {
            String::new()
        } else {
            format!("\"{title}\"")
        };

        let candidates = [
            join_terms(&[&quoted_title, author, isbn, "book cover"]),
            join_terms(&[&quoted_title, author, "book cover"]),
            join_terms(&[title, "book cover"]),
            join_terms(&[title]),
        ];

        let mut queries: Vec<String> = Vec::with_capacity(candidates.len());
        for query in candidates {
            // A query of only the suffix says nothing about the book
            if query.is_empty() || query == "book cover" || queries.contains(&query) {
                continue;
            }
            queries.push(query);
        }
        queries
    }

    /// Every query tried as JPEG first, then PNG.
    pub fn search_attempts(&self) -> Vec<CoverSearchAttempt> {
        self.search_queries()
            .into_iter()
            .flat_map(|query| {
                [FileType::Jpg, FileType::Png].map(|file_type| CoverSearchAttempt {
                    query: query.clone(),
                    file_type,
                })
            })
            .collect()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn join_terms(terms: &[&str]) -> String {
    terms
        .iter()
        .flat_map(|term| term.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}
