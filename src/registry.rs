//! Wires the movie handlers into dispatcher coroutines.

use tracing::error;

use crate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use crate::handlers;
use crate::store::MovieStore;

/// Register every movie handler named by [`crate::routes::movie_routes`].
///
/// Each handler runs in its own coroutine with a clone of the store handle.
///
/// # Safety
///
/// Calls [`Dispatcher::register_handler`], which spawns `may` coroutines. The
/// May runtime must be initialized first; call this during startup only.
pub unsafe fn register_all(dispatcher: &mut Dispatcher, store: &MovieStore) {
    register(dispatcher, store, "list_movies", handlers::list_movies);
    register(dispatcher, store, "get_movie", handlers::get_movie);
    register(dispatcher, store, "create_movie", handlers::create_movie);
    register(dispatcher, store, "update_movie", handlers::update_movie);
    register(dispatcher, store, "delete_movie", handlers::delete_movie);
}

unsafe fn register<F>(dispatcher: &mut Dispatcher, store: &MovieStore, name: &str, handler: F)
where
    F: Fn(&MovieStore, &HandlerRequest) -> HandlerResponse + Send + Clone + 'static,
{
    let store = store.clone();
    dispatcher.register_handler(name, move |req: HandlerRequest| {
        let response = handler(&store, &req);
        if let Err(e) = req.reply_tx.send(response) {
            error!(
                request_id = %req.request_id,
                handler_name = %req.handler_name,
                error = %e,
                "failed to send handler response"
            );
        }
    });
}
