//! Reconstruct every frame of a recorded dataset and export the meshes
//!
//! Frames are visited from the last to the first. Each one is written to
//! `<output>/NNNNNNNN.ply`; an optional OBJ model is exported alongside in
//! green, split into meshes of at most 25000 vertices.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::{debug, info, warn};

use depthview_core::{encode_color, Drawable};
use depthview_demos::{reconstruct, FrameSettings};
use depthview_image::reclaim_channel;
use depthview_io::{read_model, write_ply, Dataset, FrameCursor};

const MODEL_VERTEX_CAP: usize = 25000;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Dataset directory
    dataset: PathBuf,

    /// OBJ model to export next to the frames
    model: Option<PathBuf>,

    /// Directory for the exported `.ply` files
    #[clap(short, long)]
    output: PathBuf,

    #[clap(flatten)]
    settings: FrameSettings,

    /// First frame to process (defaults to the last one)
    #[clap(long)]
    start: Option<usize>,

    /// Number of frames to process (defaults to all)
    #[clap(long)]
    count: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let dataset = Dataset::open(&args.dataset)?;
    std::fs::create_dir_all(&args.output)?;

    if let Some(path) = &args.model {
        let meshes = read_model(path, Some(MODEL_VERTEX_CAP))?;
        for (i, mut mesh) in meshes.into_iter().enumerate() {
            mesh.fill_color(encode_color(0, 128, 0));
            write_ply(&mesh, args.output.join(format!("model_{:02}.ply", i)))?;
        }
    }

    let (reclaimer, textures) = reclaim_channel();
    let mut cursor = match args.start {
        Some(start) => FrameCursor::new(dataset.frame_count(), start),
        None => dataset.cursor(),
    };
    let count = args.count.unwrap_or(dataset.frame_count()).min(dataset.frame_count());

    let now = Instant::now();
    let mut written = 0;
    for _ in 0..count {
        let index = cursor.index();
        match reconstruct(&dataset, index, &args.settings, &reclaimer) {
            Ok(map) => {
                let mesh = map.into_mesh();
                if mesh.is_empty() {
                    warn!("frame {} produced no surface", index);
                } else {
                    let (min, max) = mesh.bounding_box();
                    debug!("frame {} spans {:?} to {:?}", index, min, max);
                }
                write_ply(&mesh, args.output.join(format!("{:08}.ply", index)))?;
                written += 1;
            }
            Err(err) => warn!("skipping frame {}: {:#}", index, err),
        }

        let released = textures.drain();
        if !released.is_empty() {
            debug!("released {} textures", released.len());
        }
        cursor.previous();
    }

    info!(
        "wrote {} of {} frames to {} in {:?}",
        written,
        count,
        args.output.display(),
        now.elapsed()
    );
    Ok(())
}
