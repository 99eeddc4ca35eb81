//! In-memory movie collection.
//!
//! The store is a single ordered `Vec<Movie>` behind an `RwLock`; every
//! operation is a linear scan or an in-place splice/merge. There is no
//! persistence: the process starts from an optional JSON seed file and loses
//! everything on exit.

use std::path::Path;
use std::sync::{Arc, RwLock};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ids::MovieId;

/// Closed set of genres a movie may carry. Wire form matches the JSON enum
/// (`"Sci-Fi"` for [`Genre::SciFi`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Crime,
    Comedy,
    Drama,
    Fantasy,
    Horror,
    Thriller,
    #[serde(rename = "Sci-Fi")]
    SciFi,
}

impl Genre {
    /// Wire name of the genre, as it appears in request and response JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Crime => "Crime",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Thriller => "Thriller",
            Genre::SciFi => "Sci-Fi",
        }
    }
}

/// One movie record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub year: u16,
    pub director: String,
    /// Running time in minutes.
    pub duration: u32,
    #[serde(default = "default_rate")]
    pub rate: f64,
    pub poster: String,
    pub genre: Vec<Genre>,
}

fn default_rate() -> f64 {
    5.0
}

/// Create payload: everything but the server-generated id. Unknown fields are
/// ignored, so only the declared properties ever reach the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub year: u16,
    pub director: String,
    pub duration: u32,
    #[serde(default = "default_rate")]
    pub rate: f64,
    pub poster: String,
    pub genre: Vec<Genre>,
}

/// Partial update payload: any subset of the writable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub director: Option<String>,
    pub duration: Option<u32>,
    pub rate: Option<f64>,
    pub poster: Option<String>,
    pub genre: Option<Vec<Genre>>,
}

impl MoviePatch {
    fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(director) = self.director {
            movie.director = director;
        }
        if let Some(duration) = self.duration {
            movie.duration = duration;
        }
        if let Some(rate) = self.rate {
            movie.rate = rate;
        }
        if let Some(poster) = self.poster {
            movie.poster = poster;
        }
        if let Some(genre) = self.genre {
            movie.genre = genre;
        }
    }
}

/// Shared handle to the movie collection.
///
/// Cloning is cheap (`Arc`); every handler coroutine owns a clone. The lock is
/// held only for the duration of a single operation, so a request sees the
/// collection either before or after another request's mutation, never halfway.
#[derive(Clone, Default)]
pub struct MovieStore {
    movies: Arc<RwLock<Vec<Movie>>>,
}

impl MovieStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given records.
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        Self {
            movies: Arc::new(RwLock::new(movies)),
        }
    }

    /// Load an initial collection from a JSON seed file (an array of records).
    pub fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        let movies: Vec<Movie> = serde_json::from_str(&raw)
            .with_context(|| format!("seed file {} is not a movie array", path.display()))?;
        info!(count = movies.len(), seed = %path.display(), "movie collection seeded");
        Ok(Self::with_movies(movies))
    }

    /// Snapshot of the whole collection, in insertion order.
    pub fn all(&self) -> Vec<Movie> {
        self.movies.read().expect("movie store lock poisoned").clone()
    }

    /// Linear scan for movies carrying the given genre (case-insensitive).
    pub fn by_genre(&self, genre: &str) -> Vec<Movie> {
        self.movies
            .read()
            .expect("movie store lock poisoned")
            .iter()
            .filter(|m| m.genre.iter().any(|g| g.as_str().eq_ignore_ascii_case(genre)))
            .cloned()
            .collect()
    }

    /// Linear scan for one movie by id.
    pub fn get(&self, id: MovieId) -> Option<Movie> {
        self.movies
            .read()
            .expect("movie store lock poisoned")
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    /// Append a new record, assigning it a fresh id. Returns the stored record.
    pub fn insert(&self, new: NewMovie) -> Movie {
        let movie = Movie {
            id: MovieId::new(),
            title: new.title,
            year: new.year,
            director: new.director,
            duration: new.duration,
            rate: new.rate,
            poster: new.poster,
            genre: new.genre,
        };
        let mut movies = self.movies.write().expect("movie store lock poisoned");
        movies.push(movie.clone());
        movie
    }

    /// Merge a partial update over the record with the given id, in place.
    /// Returns the updated record, or `None` if the id is unknown.
    pub fn apply_patch(&self, id: MovieId, patch: MoviePatch) -> Option<Movie> {
        let mut movies = self.movies.write().expect("movie store lock poisoned");
        let movie = movies.iter_mut().find(|m| m.id == id)?;
        patch.apply(movie);
        Some(movie.clone())
    }

    /// Splice out the record with the given id. Returns `true` if one existed.
    pub fn remove(&self, id: MovieId) -> bool {
        let mut movies = self.movies.write().expect("movie store lock poisoned");
        match movies.iter().position(|m| m.id == id) {
            Some(idx) => {
                movies.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.movies.read().expect("movie store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
