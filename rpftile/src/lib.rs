//! RpfTile - CADRG/RPF map tile decoding and paging.
//!
//! This library parses the Table of Contents of an RPF dataset, decodes
//! vector-quantized CADRG/CIB frame files into RGB tiles, and serves
//! those tiles to a renderer through a bounded, spatially coherent cache
//! that tracks a moving viewpoint.
//!
//! The typical flow: build a [`service::MapService`] from a
//! [`config::MapConfig`], point it at a reference coordinate, then call
//! [`service::MapService::update`] once per render tick and read resident
//! tiles back with [`service::MapService::get_pixels`].

pub mod catalog;
pub mod config;
pub mod coord;
pub mod frame;
pub mod pager;
pub mod reader;
pub mod rpf;
pub mod service;
pub mod toc;

pub use config::MapConfig;
pub use coord::{TilePosition, TILE_SIZE};
pub use frame::{Clut, ClutSize, DecodedFrame, FrameDecoder, Rgb};
pub use pager::{TilePager, TilePixels, TileSource, TILE_BYTES};
pub use service::{MapService, ServiceError};
pub use toc::{TocFile, TocParser, Zone};
