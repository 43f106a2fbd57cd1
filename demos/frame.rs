//! Shared per-frame reconstruction for the command line drivers

use anyhow::{anyhow, Context, Result};
use clap::{Args, ValueEnum};
use depthview_image::{PixelBuffer, TextureReclaimer};
use depthview_io::{read_pcl, CameraKind, Dataset};
use depthview_reconstruction::{Depthmap, DepthmapConfig, SmoothingKernel};
use log::{debug, info};

/// How the reconstructed surface is colored
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    /// Color from vertex normals
    Normals,
    /// Color sampled from the camera image
    Image,
}

#[derive(Args, Clone, Debug)]
pub struct FrameSettings {
    /// Color image pixels per grid cell
    #[clap(long, default_value_t = 12)]
    pub cell_size: u32,

    /// Gap and discontinuity tolerance in cells
    #[clap(long, default_value_t = 4)]
    pub kernel: usize,

    /// Smoothing iterations
    #[clap(long, default_value_t = 3)]
    pub smooth: usize,

    /// Use the edge-preserving smoothing kernel with this range sigma in meters
    #[clap(long)]
    pub bilateral: Option<f32>,

    /// Merge fully covered blocks of this many cells
    #[clap(long)]
    pub lowpoly: Option<usize>,

    #[clap(long, value_enum, default_value_t = Shading::Normals)]
    pub shading: Shading,
}

impl FrameSettings {
    pub fn config(&self) -> DepthmapConfig {
        let config = DepthmapConfig::default().with_cell_size(self.cell_size);
        let lambda = config.smoothing.lambda();
        match self.bilateral {
            Some(range_sigma) => config.with_smoothing(SmoothingKernel::Bilateral { lambda, range_sigma }),
            None => config,
        }
    }
}

/// Load frame `index` of `dataset` and run the full surface pipeline on it.
///
/// The color image posts its texture to `reclaimer` when dropped.
pub fn reconstruct(
    dataset: &Dataset,
    index: usize,
    settings: &FrameSettings,
    reclaimer: &TextureReclaimer,
) -> Result<Depthmap> {
    let image_path = dataset.file_name(index, ".jpg");
    let mut image = PixelBuffer::open(&image_path)
        .with_context(|| format!("reading {}", image_path.display()))?
        .with_reclaimer(reclaimer.clone());
    image.set_name(format!("frame {}", index));

    let cloud_path = dataset.file_name(index, ".pcl");
    let cloud = read_pcl(&cloud_path).with_context(|| format!("reading {}", cloud_path.display()))?;

    let sensor_to_world = dataset.pose(index, CameraKind::Depth)?.to_transform();
    let world_to_camera = dataset
        .pose(index, CameraKind::Color)?
        .to_transform()
        .inverse()
        .ok_or_else(|| anyhow!("color pose of frame {} is singular", index))?;

    let mut map = Depthmap::new(
        &image,
        &cloud,
        &sensor_to_world,
        &world_to_camera,
        dataset.calibration(),
        settings.config(),
    )?;
    map.make_surface(settings.kernel);
    map.smooth_surface(settings.smooth);

    if let Some(block) = settings.lowpoly.filter(|&b| b > 1) {
        let mut joined = 0;
        for y in (0..map.height()).step_by(block) {
            for x in (0..map.width()).step_by(block) {
                if map.join(x, y, x + block, y + block)? {
                    joined += 1;
                }
            }
        }
        debug!("frame {}: joined {} blocks", index, joined);
    }

    map.reindex();
    map.generate_normals()?;
    if settings.shading == Shading::Normals {
        map.normals_to_color()?;
    }

    info!(
        "frame {}: {} samples -> {} triangles",
        index,
        cloud.len(),
        map.triangle_count()
    );
    Ok(map)
}
