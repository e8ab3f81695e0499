// Resolver module - audio source resolution for the playback host

pub mod backend;
pub mod errors;
pub mod extractor;
pub mod mix;
pub mod models;
pub mod orchestrator;
pub mod playlist;
pub mod urls;
pub mod utils;

pub use errors::SourceError;
pub use models::{
    ClientVariant, Credential, PlaylistInfo, QueryKind, RequestContext, Resolved, SourceConfig,
    TrackInfo,
};
pub use orchestrator::SourceResolver;
