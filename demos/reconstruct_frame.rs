//! Reconstruct a single dataset frame and save it as an indexed PLY with normals

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use depthview_demos::{reconstruct, FrameSettings};
use depthview_image::reclaim_channel;
use depthview_io::{write_indexed_ply, Dataset};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Dataset directory
    dataset: PathBuf,

    /// Frame index
    frame: usize,

    /// Name of a `.ply` file to write
    #[clap(short, long)]
    out: PathBuf,

    #[clap(flatten)]
    settings: FrameSettings,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let dataset = Dataset::open(&args.dataset)?;
    if args.frame >= dataset.frame_count() {
        bail!("frame {} out of range, dataset has {}", args.frame, dataset.frame_count());
    }

    let (reclaimer, _textures) = reclaim_channel();
    let map = reconstruct(&dataset, args.frame, &args.settings, &reclaimer)?;
    let mesh = map.indexed_mesh().context("reconstruction produced no indexed mesh")?;

    write_indexed_ply(mesh, &args.out)?;
    info!(
        "wrote {} vertices, {} faces to {}",
        mesh.vertex_count(),
        mesh.face_count(),
        args.out.display()
    );
    Ok(())
}
