//! Two-dimensional lookup tables with bilinear sampling and a parallel
//! row-chunked builder.

use glam::{Vec2, Vec3, Vec4};

/// Value stored in a lookup table texel.
pub trait Texel: Copy + Default + Send + Sync + 'static {
    fn add(self, other: Self) -> Self;
    fn scale(self, s: f32) -> Self;
    /// Widen to RGBA for export (missing channels are zero, alpha one).
    fn to_rgba(self) -> Vec4;
    /// Number of meaningful channels.
    const CHANNELS: usize;
}

impl Texel for f32 {
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn scale(self, s: f32) -> Self {
        self * s
    }
    fn to_rgba(self) -> Vec4 {
        Vec4::new(self, 0.0, 0.0, 1.0)
    }
    const CHANNELS: usize = 1;
}

impl Texel for Vec2 {
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn scale(self, s: f32) -> Self {
        self * s
    }
    fn to_rgba(self) -> Vec4 {
        Vec4::new(self.x, self.y, 0.0, 1.0)
    }
    const CHANNELS: usize = 2;
}

impl Texel for Vec3 {
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn scale(self, s: f32) -> Self {
        self * s
    }
    fn to_rgba(self) -> Vec4 {
        self.extend(1.0)
    }
    const CHANNELS: usize = 3;
}

impl Texel for Vec4 {
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn scale(self, s: f32) -> Self {
        self * s
    }
    fn to_rgba(self) -> Vec4 {
        self
    }
    const CHANNELS: usize = 4;
}

/// Map `x ∈ [0, 1]` onto texel centres of a table `size` texels wide.
#[inline]
pub fn unit_to_texel_coord(x: f32, size: f32) -> f32 {
    0.5 / size + x * (1.0 - 1.0 / size)
}

/// Exact inverse of [`unit_to_texel_coord`].
#[inline]
pub fn texel_coord_to_unit(u: f32, size: f32) -> f32 {
    (u - 0.5 / size) / (1.0 - 1.0 / size)
}

/// Normalized coordinate of the centre of texel `(x, y)` in a
/// `width` × `height` table.
#[inline]
pub fn texel_center(x: u32, y: u32, width: u32, height: u32) -> Vec2 {
    Vec2::new(
        (x as f32 + 0.5) / width.max(1) as f32,
        (y as f32 + 0.5) / height.max(1) as f32,
    )
}

/// Number of build threads; zero picks one per logical CPU.
pub fn worker_count(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}

/// Fill a row-major buffer `width` texels wide by evaluating `texel(x, y)`
/// on up to `threads` scoped threads, one contiguous band of rows each.
pub fn fill_rows<T, F>(data: &mut [T], width: usize, threads: usize, texel: F)
where
    T: Send,
    F: Fn(usize, usize) -> T + Sync,
{
    if width == 0 || data.is_empty() {
        return;
    }
    let rows = data.len().div_ceil(width);
    let workers = threads.clamp(1, rows);
    if workers == 1 {
        for (i, value) in data.iter_mut().enumerate() {
            *value = texel(i % width, i / width);
        }
        return;
    }

    let rows_per_band = rows.div_ceil(workers);
    let texel = &texel;
    std::thread::scope(|scope| {
        for (band, chunk) in data.chunks_mut(rows_per_band * width).enumerate() {
            let first_row = band * rows_per_band;
            scope.spawn(move || {
                for (i, value) in chunk.iter_mut().enumerate() {
                    *value = texel(i % width, first_row + i / width);
                }
            });
        }
    });
}

/// Row-major table of `T` addressed by normalized `[0, 1]²` coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Lut2D<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Texel> Lut2D<T> {
    /// Zero-filled table. Dimensions are at least one texel.
    pub fn new(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![T::default(); (width * height) as usize],
        }
    }

    /// Evaluate `texel(x, y)` for every texel on `threads` workers.
    pub fn build<F>(width: u32, height: u32, threads: usize, texel: F) -> Self
    where
        F: Fn(u32, u32) -> T + Sync,
    {
        let mut lut = Self::new(width, height);
        let row = lut.width as usize;
        fill_rows(&mut lut.data, row, worker_count(threads), |x, y| {
            texel(x as u32, y as u32)
        });
        lut
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Texel at integer coordinates, clamped to the edge.
    pub fn texel(&self, x: u32, y: u32) -> T {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.data[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, value: T) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// Normalized coordinate of the centre of texel `(x, y)`.
    pub fn texel_center(&self, x: u32, y: u32) -> Vec2 {
        texel_center(x, y, self.width, self.height)
    }

    /// Bilinear sample with clamp-to-edge addressing.
    pub fn sample(&self, uv: Vec2) -> T {
        let fx = (uv.x * self.width as f32 - 0.5).clamp(0.0, (self.width - 1) as f32);
        let fy = (uv.y * self.height as f32 - 0.5).clamp(0.0, (self.height - 1) as f32);
        if !(fx.is_finite() && fy.is_finite()) {
            return self.texel(0, 0);
        }
        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let top = self
            .texel(x0, y0)
            .scale(1.0 - tx)
            .add(self.texel(x0 + 1, y0).scale(tx));
        let bottom = self
            .texel(x0, y0 + 1)
            .scale(1.0 - tx)
            .add(self.texel(x0 + 1, y0 + 1).scale(tx));
        top.scale(1.0 - ty).add(bottom.scale(ty))
    }

    /// Every texel widened to RGBA, for export.
    pub fn rgba_texels(&self) -> impl Iterator<Item = Vec4> + '_ {
        self.data.iter().map(|t| t.to_rgba())
    }
}

impl<T: Texel + bytemuck::Pod> Lut2D<T> {
    /// Raw texel bytes, e.g. for a GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
