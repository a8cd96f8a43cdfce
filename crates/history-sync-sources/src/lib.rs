pub mod error;
pub mod tautulli;
pub mod traits;

pub use error::SourceError;
pub use tautulli::TautulliClient;
pub use traits::HistorySource;
