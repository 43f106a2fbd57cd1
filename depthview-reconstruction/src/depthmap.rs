//! One reconstruction session: a color frame plus its depth cloud

use crate::config::{DepthmapConfig, SmoothingKernel};
use crate::grid::{SurfaceGrid, SurfacePoint};
use depthview_core::{DepthCloud, Error, Intrinsics, Mesh, Point3f, Result, Transform3D, TriangleMesh};
use depthview_image::PixelBuffer;
use log::debug;

/// Builds a colored surface from one RGB-D frame.
///
/// The stages run in order: [`Depthmap::new`] projects the samples onto the
/// grid, then `make_surface`, `smooth_surface`, optionally `join`, then
/// `reindex`, `generate_normals` and `normals_to_color`. Faces are kept as
/// grid cell indices until `reindex` compacts them into a [`TriangleMesh`].
#[derive(Debug, Clone)]
pub struct Depthmap {
    /// Cells as projected, before any filling or smoothing
    pub(crate) sampled: SurfaceGrid,
    pub(crate) grid: SurfaceGrid,
    pub(crate) viewpoint: Point3f,
    pub(crate) smoothing: SmoothingKernel,
    pub(crate) faces: Vec<[usize; 3]>,
    pub(crate) indexed: Option<TriangleMesh>,
}

impl Depthmap {
    /// Project a depth cloud onto the color frame.
    ///
    /// Samples are moved into world space with `sensor_to_world`, then into
    /// the color camera with `world_to_camera`, and kept if they land inside
    /// `image`. Each grid cell keeps the sample nearest to the camera and
    /// takes its color from the pixel the sample projects to.
    pub fn new(
        image: &PixelBuffer,
        cloud: &DepthCloud,
        sensor_to_world: &Transform3D,
        world_to_camera: &Transform3D,
        intrinsics: Intrinsics,
        config: DepthmapConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !(intrinsics.fx > 0.0 && intrinsics.fy > 0.0) {
            return Err(Error::InvalidData(format!(
                "focal lengths must be positive, got fx={} fy={}",
                intrinsics.fx, intrinsics.fy
            )));
        }
        let camera_to_world = world_to_camera
            .inverse()
            .ok_or_else(|| Error::InvalidData("world_to_camera is not invertible".to_string()))?;

        let cell = config.cell_size;
        let (width, height) = (image.width(), image.height());
        let mut grid = SurfaceGrid::new(
            width.div_ceil(cell) as usize,
            height.div_ceil(cell) as usize,
            cell as f32 / intrinsics.fx,
        );

        let mut rejected = 0usize;
        for sample in cloud {
            if !config.accepts(sample) {
                rejected += 1;
                continue;
            }
            let world = sensor_to_world.transform_point(&sample.position);
            let camera = world_to_camera.transform_point(&world);
            let Some(pixel) = intrinsics.project(&camera) else {
                rejected += 1;
                continue;
            };
            if !(pixel.x >= 0.0 && pixel.x < width as f32 && pixel.y >= 0.0 && pixel.y < height as f32) {
                rejected += 1;
                continue;
            }

            let (u, v) = (pixel.x as u32, pixel.y as u32);
            grid.insert_nearest(
                (u / cell) as usize,
                (v / cell) as usize,
                SurfacePoint {
                    position: world,
                    depth: camera.z,
                    color: image.get_color(u as i32, v as i32),
                },
            );
        }

        debug!(
            "depthmap: {} samples, {} rejected, {}/{} cells filled",
            cloud.len(),
            rejected,
            grid.valid_count(),
            grid.len()
        );

        Ok(Self::from_grid(grid, camera_to_world.origin()).with_smoothing(config.smoothing))
    }

    /// Start a session from an already populated grid seen from `viewpoint`
    pub fn from_grid(grid: SurfaceGrid, viewpoint: Point3f) -> Self {
        Self {
            sampled: grid.clone(),
            grid,
            viewpoint,
            smoothing: SmoothingKernel::default(),
            faces: Vec::new(),
            indexed: None,
        }
    }

    /// Replace the kernel used by `smooth_surface`
    pub fn with_smoothing(mut self, smoothing: SmoothingKernel) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn grid(&self) -> &SurfaceGrid {
        &self.grid
    }

    /// Camera center in world space
    pub fn viewpoint(&self) -> Point3f {
        self.viewpoint
    }

    /// Triangles in the current soup
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// The compacted mesh, once `reindex` has run
    pub fn indexed_mesh(&self) -> Option<&TriangleMesh> {
        self.indexed.as_ref()
    }

    /// Flat renderable mesh of the current state.
    ///
    /// Before `reindex` the soup is expanded straight from the grid.
    pub fn mesh(&self) -> Mesh {
        if let Some(indexed) = &self.indexed {
            return indexed.to_render_mesh();
        }
        let mut mesh = Mesh::with_capacity(self.faces.len());
        for face in &self.faces {
            if let (Some(a), Some(b), Some(c)) =
                (self.grid.cell(face[0]), self.grid.cell(face[1]), self.grid.cell(face[2]))
            {
                mesh.push_triangle([a.position, b.position, c.position], [a.color, b.color, c.color]);
            }
        }
        mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh()
    }
}

/// Wind `face` so that its normal points at `viewpoint`
pub(crate) fn orient_toward(viewpoint: &Point3f, corners: [&SurfacePoint; 3], face: [usize; 3]) -> [usize; 3] {
    let [a, b, c] = corners.map(|p| p.position);
    let normal = (b - a).cross(&(c - a));
    let centroid = Point3f::from((a.coords + b.coords + c.coords) / 3.0);
    if normal.dot(&(viewpoint - centroid)) < 0.0 {
        [face[0], face[2], face[1]]
    } else {
        face
    }
}
