pub mod health;
pub mod refresh;
pub mod search;
pub mod servers;

pub use health::{health_handler, ready_handler};
pub use refresh::refresh_handler;
pub use search::search_handler;
pub use servers::servers_handler;
