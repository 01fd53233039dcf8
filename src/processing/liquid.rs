//! Content-aware rescaling by seam carving.
//!
//! A seam is a path of one pixel per row whose horizontal position moves by at
//! most `delta_x` between rows. Shrinking removes the lowest-energy seams one at
//! a time; growing finds the seams that would be removed first and duplicates
//! them. Height changes run the same algorithm on the transposed image.

use image::{Rgba, RgbaImage};

/// Upper bound on [`carve_cost`] for one rescale.
pub const MAX_CARVE_COST: u64 = 2_000_000_000;

/// Pixels visited while carving `from` to `to`: every seam scans the whole
/// grid it is found on.
pub fn carve_cost(from: (u32, u32), to: (u32, u32)) -> u64 {
    let (fw, fh) = (u64::from(from.0), u64::from(from.1));
    let (tw, th) = (u64::from(to.0), u64::from(to.1));
    let width_pass = fw.abs_diff(tw).saturating_mul(fw.max(tw).saturating_mul(fh));
    let height_pass = fh.abs_diff(th).saturating_mul(fh.max(th).saturating_mul(tw));
    width_pass.saturating_add(height_pass)
}

pub fn liquid_rescale(
    image: &RgbaImage,
    width: u32,
    height: u32,
    delta_x: u32,
    rigidity: f64,
) -> RgbaImage {
    let delta_x = delta_x as usize;
    let mut grid = Grid::from_image(image);
    grid = carve_to(grid, width as usize, delta_x, rigidity);
    if grid.height != height as usize {
        grid = carve_to(grid.transposed(), height as usize, delta_x, rigidity).transposed();
    }
    grid.into_image()
}

#[derive(Clone)]
struct Grid {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl Grid {
    fn from_image(image: &RgbaImage) -> Self {
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            pixels: image.pixels().map(|p| p.0).collect(),
        }
    }

    fn into_image(self) -> RgbaImage {
        let width = self.width;
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Rgba(self.pixels[y as usize * width + x as usize])
        })
    }

    fn transposed(&self) -> Self {
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for x in 0..self.width {
            for y in 0..self.height {
                pixels.push(self.pixels[y * self.width + x]);
            }
        }
        Self {
            width: self.height,
            height: self.width,
            pixels,
        }
    }

    /// Gradient magnitude of luminance, premultiplied by alpha.
    fn energy(&self) -> Vec<f64> {
        let lum: Vec<f64> = self
            .pixels
            .iter()
            .map(|[r, g, b, a]| {
                (0.299 * f64::from(*r) + 0.587 * f64::from(*g) + 0.114 * f64::from(*b))
                    * f64::from(*a)
                    / 255.0
            })
            .collect();
        let (w, h) = (self.width, self.height);
        let at = |x: usize, y: usize| lum[y * w + x];

        let mut energy = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let dx = at((x + 1).min(w - 1), y) - at(x.saturating_sub(1), y);
                let dy = at(x, (y + 1).min(h - 1)) - at(x, y.saturating_sub(1));
                energy.push(dx.abs() + dy.abs());
            }
        }
        energy
    }

    fn find_seam(&self, delta_x: usize, rigidity: f64) -> Vec<usize> {
        let (w, h) = (self.width, self.height);
        let mut cost = self.energy();
        let mut from = vec![0usize; w * h];

        for y in 1..h {
            for x in 0..w {
                let above = (y - 1) * w;
                // Straight down wins ties
                let mut best = cost[above + x];
                let mut best_x = x;
                for px in x.saturating_sub(delta_x)..=(x + delta_x).min(w - 1) {
                    let candidate = cost[above + px] + rigidity * px.abs_diff(x) as f64;
                    if candidate < best {
                        best = candidate;
                        best_x = px;
                    }
                }
                cost[y * w + x] += best;
                from[y * w + x] = best_x;
            }
        }

        let last = (h - 1) * w;
        let mut x = (0..w)
            .min_by(|a, b| cost[last + a].total_cmp(&cost[last + b]))
            .unwrap_or(0);
        let mut seam = vec![0; h];
        for y in (0..h).rev() {
            seam[y] = x;
            x = from[y * w + x];
        }
        seam
    }

    fn remove_seam<T: Copy>(values: &[T], width: usize, seam: &[usize]) -> Vec<T> {
        let mut out = Vec::with_capacity(values.len() - seam.len());
        for (y, &skip) in seam.iter().enumerate() {
            let row = &values[y * width..(y + 1) * width];
            out.extend(row.iter().enumerate().filter(|(x, _)| *x != skip).map(|(_, v)| *v));
        }
        out
    }

    fn without_seam(&self, seam: &[usize]) -> Self {
        Self {
            width: self.width - 1,
            height: self.height,
            pixels: Self::remove_seam(&self.pixels, self.width, seam),
        }
    }
}

fn carve_to(mut grid: Grid, target: usize, delta_x: usize, rigidity: f64) -> Grid {
    if grid.height == 0 || grid.width == 0 {
        return grid;
    }
    while grid.width > target {
        let seam = grid.find_seam(delta_x, rigidity);
        grid = grid.without_seam(&seam);
    }
    while grid.width < target {
        // One pass can duplicate at most every column but one
        let count = (target - grid.width).min(grid.width.saturating_sub(1).max(1));
        grid = insert_seams(&grid, count, delta_x, rigidity);
    }
    grid
}

/// Duplicates the `count` seams that removal would pick first.
fn insert_seams(grid: &Grid, count: usize, delta_x: usize, rigidity: f64) -> Grid {
    let (w, h) = (grid.width, grid.height);
    let mut duplicates = vec![0usize; w * h];

    let mut work = grid.clone();
    let mut origin: Vec<usize> = (0..h).flat_map(|_| 0..w).collect();
    for _ in 0..count {
        let seam = if work.width > 1 {
            work.find_seam(delta_x, rigidity)
        } else {
            vec![0; h]
        };
        for (y, &x) in seam.iter().enumerate() {
            duplicates[y * w + origin[y * work.width + x]] += 1;
        }
        if work.width > 1 {
            origin = Grid::remove_seam(&origin, work.width, &seam);
            work = work.without_seam(&seam);
        }
    }

    let mut pixels = Vec::with_capacity((w + count) * h);
    for y in 0..h {
        for x in 0..w {
            let pixel = grid.pixels[y * w + x];
            pixels.push(pixel);
            let right = grid.pixels[y * w + (x + 1).min(w - 1)];
            for _ in 0..duplicates[y * w + x] {
                pixels.push(blend(pixel, right));
            }
        }
    }
    Grid {
        width: w + count,
        height: h,
        pixels,
    }
}

fn blend(a: [u8; 4], b: [u8; 4]) -> [u8; 4] {
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = ((u16::from(a[i]) + u16::from(b[i])) / 2) as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat grey with one bright vertical stripe at `stripe_x`.
    fn striped(width: u32, height: u32, stripe_x: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x == stripe_x {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([80, 80, 80, 255])
            }
        })
    }

    #[test]
    fn shrinking_keeps_high_energy_content() {
        let image = striped(20, 8, 10);
        let out = liquid_rescale(&image, 12, 8, 1, 0.0);
        assert_eq!(out.dimensions(), (12, 8));
        // The stripe survives somewhere in every row
        for y in 0..8 {
            assert!((0..12).any(|x| out.get_pixel(x, y).0 == [255, 255, 255, 255]));
        }
    }

    #[test]
    fn growing_and_height_changes_hit_the_target() {
        let image = striped(10, 6, 3);
        assert_eq!(liquid_rescale(&image, 25, 6, 1, 0.5).dimensions(), (25, 6));
        assert_eq!(liquid_rescale(&image, 10, 3, 0, 0.0).dimensions(), (10, 3));
        assert_eq!(liquid_rescale(&image, 4, 9, 2, 1.0).dimensions(), (4, 9));
    }

    #[test]
    fn single_column_can_grow() {
        let image = striped(1, 3, 0);
        assert_eq!(liquid_rescale(&image, 5, 3, 1, 0.0).dimensions(), (5, 3));
    }

    #[test]
    fn carve_cost_counts_both_passes() {
        assert_eq!(carve_cost((100, 50), (100, 50)), 0);
        assert_eq!(carve_cost((100, 50), (90, 50)), 10 * 100 * 50);
        assert_eq!(carve_cost((100, 50), (100, 60)), 10 * 60 * 100);
        assert!(carve_cost((4000, 4000), (10, 10)) > MAX_CARVE_COST);
    }

    #[test]
    fn straight_seams_with_zero_delta() {
        let grid = Grid::from_image(&striped(6, 5, 2));
        let seam = grid.find_seam(0, 0.0);
        assert!(seam.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
