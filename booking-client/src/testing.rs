//! Mock service helpers for tests

use warp::Reply;
use warp::filters::BoxedFilter;

/// Serves the routes on an ephemeral local port, returning the base URL
pub async fn serve<R>(routes: BoxedFilter<(R,)>) -> String
where
    R: Reply + 'static,
{
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{addr}")
}
