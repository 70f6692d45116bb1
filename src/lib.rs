//! Compiles decoded level terrain data into render-ready cell meshes.
//!
//! A terrain cell arrives as a raster of packed height/normal samples plus
//! per-grid-point blend weights over an arbitrary number of layers, but each
//! rendered vertex can carry at most four layer weights. Per cell the
//! pipeline packs the quad layer combinations into four-slot channel groups,
//! duplicates shared vertices where adjacent quads need incompatible groups,
//! and emits one indexed submesh per distinct layer combination together
//! with its material binding record.
//!
//! [`level`] decodes the binary level container (scene settings, reflection
//! probes, static mesh placements, landscape); [`terrain`] holds the compile
//! pipeline. Cells are independent: [`terrain::compile_landscape`] fans them
//! out across the rayon pool.

pub mod error;
pub mod level;
pub mod terrain;

pub use error::{Error, Result};
pub use level::{decode_level, Landscape, Level};
pub use terrain::{compile_cell, compile_landscape, CellMesh, LandscapeCell};

use tracing::Level as LogLevel;
use tracing_subscriber::FmtSubscriber;

/// Install a global stdout tracing subscriber. Intended for binaries and
/// tools embedding the compiler; libraries should leave subscriber choice to
/// the host application.
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(LogLevel::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");
}
