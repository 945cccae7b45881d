// Stats API module
// Read-only JSON view of the file-serving counters, served on its own listener

mod response;

use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::AppState;
use crate::http::response::empty_body;
use crate::http::FsBody;

pub use response::{json_response, method_not_allowed, not_found};

/// Stats route handler
///
/// `GET /debug/vars` and `GET /stats` return the counter snapshot. HEAD gets
/// the same headers without a body. The stats listener never touches the file
/// counters, so polling it does not skew them.
pub async fn handle_stats_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Result<Response<FsBody>, Infallible> {
    let is_head = req.method() == Method::HEAD;
    let mut resp = match (req.method(), req.uri().path()) {
        (&Method::GET | &Method::HEAD, "/debug/vars" | "/stats") => {
            json_response(hyper::StatusCode::OK, &state.counters.snapshot())
        }
        (&Method::GET | &Method::HEAD, _) => not_found(),
        _ => method_not_allowed(),
    };

    if is_head {
        *resp.body_mut() = empty_body();
    }
    Ok(resp)
}
