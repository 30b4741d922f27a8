mod client;

pub use client::{sha1_hex, ArtifactFetcher, Downloader};
