pub mod errors;
pub mod filters;
pub mod format;
pub mod forge;
pub mod generation;
pub mod models;
pub mod progress;
pub mod reforge;
pub mod repo;
pub mod settings;
pub mod stats;
pub mod study;
pub mod validate;

pub use errors::*;
pub use filters::*;
pub use format::*;
pub use forge::*;
pub use generation::*;
pub use models::*;
pub use progress::*;
pub use reforge::*;
pub use repo::*;
pub use settings::*;
pub use stats::*;
pub use study::*;
pub use validate::*;
