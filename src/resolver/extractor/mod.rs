// External extractor integration
//
// Wraps the yt-dlp command line tool for the jobs the metadata backend
// cannot do: minting fresh stream URLs and pulling metadata for pages
// outside the recognized hosts.

pub mod cookies;
pub mod diagnostics;
pub mod ytdlp;

pub use ytdlp::YtDlpClient;
