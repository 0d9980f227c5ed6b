pub mod config;
pub mod error;
pub mod games_csv;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod model;
pub mod nhl;
pub mod pipeline;
pub mod records;
pub mod rivalry;
pub mod scoring;
pub mod season_index;
pub mod sources;
pub mod title_parser;
pub mod video_index;
pub mod videos_csv;
pub mod youtube;
