//! Request handlers for the movie collection.
//!
//! Each handler is a pure function from request plus store to response;
//! [`crate::registry`] wires them into dispatcher coroutines.

use serde_json::json;
use tracing::warn;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::ids::MovieId;
use crate::store::{MoviePatch, MovieStore, NewMovie};

const NOT_FOUND: &str = "Movie not found";

/// `GET /movies` with optional `?genre=` filter.
///
/// An unknown genre filters to an empty list rather than erroring.
pub fn list_movies(store: &MovieStore, req: &HandlerRequest) -> HandlerResponse {
    let movies = match req.get_query_param("genre") {
        Some(genre) => store.by_genre(genre),
        None => store.all(),
    };
    match serde_json::to_value(movies) {
        Ok(body) => HandlerResponse::json(200, body),
        Err(e) => {
            warn!(error = %e, "failed to serialize movie list");
            HandlerResponse::error(500, "Internal Server Error")
        }
    }
}

/// `GET /movies/{id}`.
///
/// A malformed id behaves like a missing movie: 404.
pub fn get_movie(store: &MovieStore, req: &HandlerRequest) -> HandlerResponse {
    let Some(id) = parse_movie_id(req) else {
        return HandlerResponse::message(404, NOT_FOUND);
    };
    match store.get(id) {
        Some(movie) => HandlerResponse::json(200, json!(movie)),
        None => HandlerResponse::message(404, NOT_FOUND),
    }
}

/// `POST /movies`. The body was schema-validated before dispatch.
pub fn create_movie(store: &MovieStore, req: &HandlerRequest) -> HandlerResponse {
    let Some(body) = req.body.clone() else {
        return HandlerResponse::error(400, "Request body required");
    };
    let new: NewMovie = match serde_json::from_value(body) {
        Ok(n) => n,
        Err(e) => {
            warn!(request_id = %req.request_id, error = %e, "movie payload failed to deserialize");
            return HandlerResponse::error(400, "Invalid movie payload");
        }
    };
    let movie = store.insert(new);
    HandlerResponse::json(201, json!(movie))
}

/// `PATCH /movies/{id}`.
///
/// An absent body is an empty patch: the stored record comes back unchanged.
pub fn update_movie(store: &MovieStore, req: &HandlerRequest) -> HandlerResponse {
    let Some(id) = parse_movie_id(req) else {
        return HandlerResponse::message(404, NOT_FOUND);
    };
    let patch: MoviePatch = match req.body.clone() {
        Some(body) => match serde_json::from_value(body) {
            Ok(p) => p,
            Err(e) => {
                warn!(request_id = %req.request_id, error = %e, "patch payload failed to deserialize");
                return HandlerResponse::error(400, "Invalid movie payload");
            }
        },
        None => MoviePatch::default(),
    };
    match store.apply_patch(id, patch) {
        Some(movie) => HandlerResponse::json(200, json!(movie)),
        None => HandlerResponse::message(404, NOT_FOUND),
    }
}

/// `DELETE /movies/{id}`.
pub fn delete_movie(store: &MovieStore, req: &HandlerRequest) -> HandlerResponse {
    let Some(id) = parse_movie_id(req) else {
        return HandlerResponse::message(404, NOT_FOUND);
    };
    if store.remove(id) {
        HandlerResponse::message(200, "Movie deleted")
    } else {
        HandlerResponse::message(404, NOT_FOUND)
    }
}

fn parse_movie_id(req: &HandlerRequest) -> Option<MovieId> {
    req.get_path_param("id")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use crate::store::{Genre, Movie};
    use http::Method;
    use may::sync::mpsc;
    use std::sync::Arc;

    fn sample_movie() -> Movie {
        Movie {
            id: MovieId::new(),
            title: "Blade Runner".to_string(),
            year: 1982,
            director: "Ridley Scott".to_string(),
            duration: 117,
            rate: 8.1,
            poster: "https://example.com/blade-runner.jpg".to_string(),
            genre: vec![Genre::SciFi],
        }
    }

    fn request(
        method: Method,
        path_params: &[(&str, &str)],
        query_params: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> HandlerRequest {
        let (tx, _rx) = mpsc::channel();
        HandlerRequest {
            request_id: RequestId::new(),
            method,
            path: "/movies".to_string(),
            handler_name: "test".to_string(),
            path_params: path_params
                .iter()
                .map(|(k, v)| (Arc::from(*k), v.to_string()))
                .collect(),
            query_params: query_params
                .iter()
                .map(|(k, v)| (Arc::from(*k), v.to_string()))
                .collect(),
            headers: Default::default(),
            cookies: Default::default(),
            body,
            reply_tx: tx,
        }
    }

    #[test]
    fn test_list_movies_returns_all() {
        let store = MovieStore::with_movies(vec![sample_movie(), sample_movie()]);
        let res = list_movies(&store, &request(Method::GET, &[], &[], None));
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_list_movies_genre_filter_case_insensitive() {
        let store = MovieStore::with_movies(vec![sample_movie()]);
        let res = list_movies(&store, &request(Method::GET, &[], &[("genre", "sci-fi")], None));
        assert_eq!(res.body.as_array().map(Vec::len), Some(1));

        let res = list_movies(&store, &request(Method::GET, &[], &[("genre", "Drama")], None));
        assert_eq!(res.body.as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_get_movie_found_and_missing() {
        let movie = sample_movie();
        let id = movie.id;
        let store = MovieStore::with_movies(vec![movie]);

        let res = get_movie(
            &store,
            &request(Method::GET, &[("id", &id.to_string())], &[], None),
        );
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Blade Runner");

        let res = get_movie(
            &store,
            &request(Method::GET, &[("id", &MovieId::new().to_string())], &[], None),
        );
        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Movie not found");
    }

    #[test]
    fn test_get_movie_malformed_id_is_404() {
        let store = MovieStore::new();
        let res = get_movie(
            &store,
            &request(Method::GET, &[("id", "not-a-uuid")], &[], None),
        );
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_create_movie_assigns_id() {
        let store = MovieStore::new();
        let body = serde_json::json!({
            "title": "Arrival",
            "year": 2016,
            "director": "Denis Villeneuve",
            "duration": 116,
            "poster": "https://example.com/arrival.jpg",
            "genre": ["Sci-Fi", "Drama"]
        });
        let res = create_movie(&store, &request(Method::POST, &[], &[], Some(body)));
        assert_eq!(res.status, 201);
        assert!(res.body["id"].is_string());
        assert_eq!(res.body["rate"], 5.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_update_movie_patches_fields() {
        let movie = sample_movie();
        let id = movie.id;
        let store = MovieStore::with_movies(vec![movie]);

        let res = update_movie(
            &store,
            &request(
                Method::PATCH,
                &[("id", &id.to_string())],
                &[],
                Some(serde_json::json!({ "rate": 9.5 })),
            ),
        );
        assert_eq!(res.status, 200);
        assert_eq!(res.body["rate"], 9.5);
        assert_eq!(res.body["title"], "Blade Runner");
    }

    #[test]
    fn test_update_movie_without_body_returns_record() {
        let movie = sample_movie();
        let id = movie.id;
        let store = MovieStore::with_movies(vec![movie]);

        let res = update_movie(
            &store,
            &request(Method::PATCH, &[("id", &id.to_string())], &[], None),
        );
        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Blade Runner");
    }

    #[test]
    fn test_update_movie_unknown_id_is_404() {
        let store = MovieStore::new();
        let res = update_movie(
            &store,
            &request(
                Method::PATCH,
                &[("id", &MovieId::new().to_string())],
                &[],
                Some(serde_json::json!({ "rate": 1.0 })),
            ),
        );
        assert_eq!(res.status, 404);
    }

    #[test]
    fn test_delete_movie() {
        let movie = sample_movie();
        let id = movie.id;
        let store = MovieStore::with_movies(vec![movie]);

        let res = delete_movie(
            &store,
            &request(Method::DELETE, &[("id", &id.to_string())], &[], None),
        );
        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "Movie deleted");
        assert!(store.is_empty());

        let res = delete_movie(
            &store,
            &request(Method::DELETE, &[("id", &id.to_string())], &[], None),
        );
        assert_eq!(res.status, 404);
    }
}
