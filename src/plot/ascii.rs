//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - observed points: `o`, further series `x`, `+`, `*`, `#`, `@`
//! - fitted curves: `-` line
//! - vertical markers (CMC, stopping potentials, resonances): `:`

use crate::domain::{FitDetails, PointMatrix};
use crate::error::AppError;
use crate::fit::cmc::format_general;
use crate::math::{cmc_model, sinc_squared_intensity};
use crate::plot::{PlotInput, Plotter};

const SERIES_GLYPHS: [char; 6] = ['o', 'x', '+', '*', '#', '@'];
const CURVE: char = '-';
const MARKER: char = ':';

/// Fixed-size character-grid plotter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiPlotter {
    pub width: usize,
    pub height: usize,
}

impl Default for AsciiPlotter {
    fn default() -> Self {
        Self {
            width: 72,
            height: 20,
        }
    }
}

impl AsciiPlotter {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Plotter for AsciiPlotter {
    fn render(&self, input: &PlotInput<'_>) -> Result<String, AppError> {
        let figure = build_figure(input, self.width.max(10));
        Ok(render_figure(&figure, self.width, self.height))
    }
}

/// Layers to draw, in data coordinates.
#[derive(Debug, Default)]
struct Figure {
    title: String,
    scatter: Vec<(char, Vec<(f64, f64)>)>,
    curves: Vec<Vec<(f64, f64)>>,
    markers: Vec<f64>,
    legend: Vec<(char, String)>,
}

impl Figure {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    fn scatter(&mut self, glyph: char, label: impl Into<String>, points: Vec<(f64, f64)>) {
        self.legend.push((glyph, label.into()));
        self.scatter.push((glyph, points));
    }

    /// Sample `f` across the x-range of the scattered points.
    fn curve<F: Fn(f64) -> f64>(&mut self, samples: usize, f: F) {
        let (x_min, x_max) = self.x_range();
        let n = samples.max(2);
        let curve = (0..n)
            .map(|i| {
                let x = x_min + (x_max - x_min) * i as f64 / (n as f64 - 1.0);
                (x, f(x))
            })
            .collect();
        self.curves.push(curve);
    }

    fn legend_fit(&mut self, label: &str) {
        self.legend.push((CURVE, label.to_string()));
    }

    fn x_range(&self) -> (f64, f64) {
        let xs = self.scatter.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.0));
        range(xs).unwrap_or((0.0, 1.0))
    }

    fn y_range(&self) -> (f64, f64) {
        let ys = self
            .scatter
            .iter()
            .flat_map(|(_, pts)| pts.iter().map(|p| p.1))
            .chain(self.curves.iter().flat_map(|c| c.iter().map(|p| p.1)));
        range(ys).unwrap_or((0.0, 1.0))
    }
}

fn column_pairs(points: &PointMatrix, j: usize) -> Vec<(f64, f64)> {
    points.rows().iter().map(|r| (r[0], r[j])).collect()
}

fn glyph(i: usize) -> char {
    SERIES_GLYPHS[i % SERIES_GLYPHS.len()]
}

fn build_figure(input: &PlotInput<'_>, samples: usize) -> Figure {
    let mut fig = Figure::new(input.mode.display_name());
    let points = input.points;

    match &input.fit.details {
        FitDetails::Line(p) => {
            fig.scatter(glyph(0), "data", column_pairs(points, 1));
            fig.curve(samples, |x| p.slope * x + p.intercept);
            fig.legend_fit("fit");
        }
        FitDetails::Transformed(t) => {
            let pts = t.transformed_points.iter().map(|p| (p[0], p[1])).collect();
            fig.scatter(glyph(0), "transformed data", pts);
            fig.curve(samples, |x| t.slope * x + t.intercept);
            fig.legend_fit("fit");
        }
        FitDetails::SoundWave(s) => {
            let pts = s.transformed_points.iter().map(|p| (p[0], p[1])).collect();
            fig.scatter(glyph(0), "λ vs 1/ν", pts);
            fig.curve(samples, |x| s.velocity * x + s.intercept);
            fig.legend_fit("fit");
        }
        FitDetails::Cmc(c) => {
            fig.scatter(glyph(0), "data", column_pairs(points, 1));
            let params = [c.a, c.b, c.c, c.cmc_value];
            fig.curve(samples, |x| cmc_model(x, &params));
            fig.legend_fit("fit");
            fig.markers.push(c.cmc_value);
            fig.legend.push((MARKER, format!("CMC ≈ {}", format_general(c.cmc_value, 4))));
        }
        FitDetails::Planck(p) => {
            let scale = if p.frequency_unit == "THz" { 1e12 } else { 1.0 };
            fig.scatter(glyph(0), "data", column_pairs(points, 1));
            fig.curve(samples, |x| p.slope * x * scale + p.intercept);
            fig.legend_fit("fit");
        }
        FitDetails::Diffraction(d) => {
            fig.scatter(glyph(0), "data", column_pairs(points, 1));
            fig.curve(samples, |x| sinc_squared_intensity(x, d.i0, d.alpha, d.theta0));
            fig.legend_fit("fit");
        }
        FitDetails::StoppingPotentials { series_fits } => {
            for (j, s) in series_fits.iter().enumerate() {
                fig.scatter(glyph(j), s.label.clone(), column_pairs(points, j + 1));
                fig.markers.push(s.stopping_potential);
            }
            fig.legend.push((MARKER, "stopping potential".to_string()));
        }
        FitDetails::Damped { series_fits } => {
            for (j, s) in series_fits.iter().enumerate() {
                fig.scatter(glyph(j), s.label.clone(), column_pairs(points, j + 1));
            }
            for s in series_fits {
                fig.curve(samples, |t| s.initial_amplitude * (-s.damping_constant * t).exp());
            }
            fig.legend_fit("fit");
        }
        FitDetails::Resonances { series_fits } => {
            for (j, s) in series_fits.iter().enumerate() {
                fig.scatter(glyph(j), s.label.clone(), column_pairs(points, j + 1));
                fig.markers.push(s.resonance_frequency);
            }
            fig.legend.push((MARKER, "resonance".to_string()));
        }
        FitDetails::WaveGroups { series_fits } => {
            for (j, g) in series_fits.iter().enumerate() {
                let pts = g.transformed_points.iter().map(|p| (p[0], p[1])).collect();
                fig.scatter(glyph(j), g.label.clone(), pts);
            }
            for g in series_fits {
                fig.curve(samples, |x| g.velocity * x + g.intercept);
            }
            fig.legend_fit("fit");
        }
    }
    fig
}

fn render_figure(fig: &Figure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = fig.x_range();
    let (y_min, y_max) = fig.y_range();
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for &m in &fig.markers {
        if m < x_min || m > x_max {
            continue;
        }
        let x = map_x(m, x_min, x_max, width);
        draw_line(&mut grid, x, 0, x, height - 1, MARKER);
    }

    // Curves before points so points overlay.
    for curve in &fig.curves {
        draw_curve(&mut grid, curve, x_min, x_max, y_min, y_max);
    }

    for (ch, pts) in &fig.scatter {
        for &(px, py) in pts {
            let x = map_x(px, x_min, x_max, width);
            let y = map_y(py, y_min, y_max, height);
            grid[y][x] = *ch;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} | x=[{}, {}] | y=[{}, {}]\n",
        fig.title,
        format_general(x_min, 4),
        format_general(x_max, 4),
        format_general(y_min, 4),
        format_general(y_max, 4),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = fig.legend.iter().map(|(g, l)| format!("{g} {l}")).collect();
    out.push_str(&legend.join("  "));
    out.push('\n');
    out
}

/// Finite min/max of `values`; a single repeated value is widened by ±0.5.
fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if max > min { Some((min, max)) } else { Some((min - 0.5, max + 0.5)) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], x_min: f64, x_max: f64, y_min: f64, y_max: f64) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !y.is_finite() {
            prev = None;
            continue;
        }
        let gx = map_x(x, x_min, x_max, width);
        let gy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, gx, gy, CURVE);
        } else if grid[gy][gx] == ' ' {
            grid[gy][gx] = CURVE;
        }
        prev = Some((gx, gy));
    }
}

/// Integer line drawing (Bresenham-ish). Only fills blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
