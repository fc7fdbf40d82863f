pub mod app;
pub mod auth;
pub mod config;
pub mod dates;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{ensure_parent_dir, load_data};
