mod routes;
mod ws_handler;

pub use routes::websocket_routes;
pub use ws_handler::{ws_handler, LiveEvent};
