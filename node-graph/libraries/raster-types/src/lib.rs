pub mod blend_mode;
pub mod color;
pub mod pool;
pub mod rect;
pub mod shape;
pub mod surface;
pub mod tile;

pub use blend_mode::BlendMode;
pub use color::Color;
pub use pool::SurfacePool;
pub use rect::RectI;
pub use shape::{ShapeData, ShapeKind};
pub use surface::{Surface, SurfaceError, TileSnapshot};
pub use tile::{Resolution, TILE_SIZE, Tile, TileCoord, TileId};
