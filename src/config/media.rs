//! Media category table: naming template, library subroot and metadata source per category.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::QbotError;
use crate::filebot::Database;

const EPISODE_FORMAT: &str = "./{n}/Season {s}/{n} - {s00e00} - {t}";
const MOVIE_FORMAT: &str = "./{ny}/{ny}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    TvShow,
    Anime,
    Movie,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 3] = [MediaCategory::TvShow, MediaCategory::Anime, MediaCategory::Movie];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::TvShow => "tv_show",
            MediaCategory::Anime => "anime",
            MediaCategory::Movie => "movie",
        }
    }

    /// filebot `--format` expression.
    pub fn naming_template(self) -> &'static str {
        match self {
            MediaCategory::TvShow | MediaCategory::Anime => EPISODE_FORMAT,
            MediaCategory::Movie => MOVIE_FORMAT,
        }
    }

    /// Library subroot, relative to the destination root.
    pub fn subroot(self) -> &'static Path {
        match self {
            MediaCategory::TvShow => Path::new("TV-Show/Real"),
            MediaCategory::Anime => Path::new("TV-Show/Anime"),
            MediaCategory::Movie => Path::new("Movie"),
        }
    }

    pub fn database(self) -> Database {
        match self {
            MediaCategory::TvShow | MediaCategory::Anime => Database::TheMovieDbTv,
            MediaCategory::Movie => Database::TheMovieDb,
        }
    }

    /// `destination/<subroot>`.
    pub fn output_root(self, destination: &Path) -> PathBuf {
        destination.join(self.subroot())
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaCategory {
    type Err = QbotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| QbotError::UnsupportedCategory(s.to_string()))
    }
}
