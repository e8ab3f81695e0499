// YouTube audio source resolver
//
// Embeds into a media playback host as one source among several: it
// classifies queries, resolves them to track or playlist metadata, and
// mints fresh stream URLs at play time.

pub mod resolver;

pub use resolver::{
    ClientVariant, Credential, PlaylistInfo, QueryKind, RequestContext, Resolved, SourceConfig,
    SourceError, SourceResolver, TrackInfo,
};
