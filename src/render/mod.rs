//! Star chart rendering
//!
//! Draws one all-sky chart: the horizon disk, the stars of a projected
//! [`SkyView`] sized and coloured by magnitude, dashed altitude circles,
//! cardinal points and a two-line title. Drawing goes through plotters into
//! an in-memory RGB buffer which is returned as an `image::RgbImage`.

use chrono::{NaiveDateTime, Timelike};
use image::RgbImage;
use ndarray::Array1;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

use crate::projection::altitude_radius;
use crate::{Result, SkylapseError};

/// Half-width of the plotted region in projection units (horizon = 1)
const VIEW_EXTENT: f64 = 1.15;
/// Height of the title band as a fraction of the chart side
const TITLE_BAND: f64 = 0.12;
/// Guide circles: altitude in degrees and opacity
///
/// Each circle sits at the stereographic radius of its altitude
/// (0.268 for 60°, 0.577 for 30°), not at evenly spaced radii.
const GUIDE_CIRCLES: [(f64, f64); 3] = [(60.0, 0.15), (30.0, 0.12), (0.0, 0.30)];
const GUIDE_LINE_WIDTH_PT: f64 = 1.2;

/// Colour and opacity for stars up to a magnitude
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarTier {
    /// Faintest magnitude in this tier; `None` catches everything fainter
    pub max_magnitude: Option<f64>,
    /// Hex colour, e.g. "#ffffcc"
    pub color: String,
    pub alpha: f64,
}

impl StarTier {
    fn new(max_magnitude: Option<f64>, color: &str, alpha: f64) -> Self {
        Self {
            max_magnitude,
            color: color.to_string(),
            alpha,
        }
    }

    fn contains(&self, magnitude: f64) -> bool {
        self.max_magnitude.map_or(true, |max| magnitude <= max)
    }
}

/// Visual constants of the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartStyle {
    /// Side of the square chart in inches
    pub chart_size: f64,
    /// Pixels per inch
    pub dpi: u32,
    /// Marker scale: a magnitude 0 star covers `2 * max_star_size` square points
    pub max_star_size: f64,
    pub background: String,
    pub horizon_fill: String,
    pub guide_color: String,
    pub cardinal_color: String,
    pub title_color: String,
    /// Draw text (titles, cardinal points, altitude labels)
    pub show_labels: bool,
    /// Checked in order; the first tier containing a star's magnitude wins
    pub tiers: Vec<StarTier>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            chart_size: 12.0,
            dpi: 120,
            max_star_size: 100.0,
            background: "#000814".to_string(),
            horizon_fill: "#001d3d".to_string(),
            guide_color: "#ffc300".to_string(),
            cardinal_color: "#36352D".to_string(),
            title_color: "#ffd60a".to_string(),
            show_labels: true,
            tiers: vec![
                StarTier::new(Some(1.5), "#ffffff", 1.0),
                StarTier::new(Some(3.0), "#ffffcc", 0.95),
                StarTier::new(Some(6.0), "#ccccff", 0.85),
                StarTier::new(None, "#ffffff", 0.80),
            ],
        }
    }
}

impl ChartStyle {
    /// Side of the chart square in pixels
    pub fn side_px(&self) -> u32 {
        (self.chart_size * f64::from(self.dpi)).round() as u32
    }

    /// Convert typographic points to pixels
    pub fn points_to_px(&self, points: f64) -> f64 {
        points * f64::from(self.dpi) / 72.0
    }

    /// Marker area in square points for a star of the given magnitude
    pub fn marker_area(&self, magnitude: f64) -> f64 {
        2.0 * self.max_star_size * 10f64.powf(magnitude / -2.5)
    }

    /// Marker radius in pixels
    ///
    /// A point marker spans half the side of its area square, so the radius
    /// is a quarter of `sqrt(area)`.
    pub fn marker_radius_px(&self, magnitude: f64) -> f64 {
        self.points_to_px(self.marker_area(magnitude).sqrt() / 4.0)
    }

    /// The tier a star of this magnitude is drawn with
    pub fn tier_for(&self, magnitude: f64) -> Option<&StarTier> {
        self.tiers.iter().find(|tier| tier.contains(magnitude))
    }

    pub fn validate(&self) -> Result<()> {
        if self.chart_size.is_nan() || self.chart_size <= 0.0 || self.side_px() < 16 {
            return Err(SkylapseError::ConfigError(format!(
                "Chart of {} in at {} dpi is too small",
                self.chart_size, self.dpi
            )));
        }
        if self.max_star_size.is_nan() || self.max_star_size <= 0.0 {
            return Err(SkylapseError::ConfigError(
                "max_star_size must be positive".to_string(),
            ));
        }
        if self.tiers.is_empty() {
            return Err(SkylapseError::ConfigError(
                "At least one star tier is required".to_string(),
            ));
        }
        for tier in &self.tiers {
            parse_hex_color(&tier.color)?;
            if !(0.0..=1.0).contains(&tier.alpha) {
                return Err(SkylapseError::ConfigError(format!(
                    "Tier alpha {} is outside [0, 1]",
                    tier.alpha
                )));
            }
        }
        Palette::from_style(self).map(|_| ())
    }
}

/// Parse "#rrggbb" (or "rrggbb") into a colour
pub fn parse_hex_color(text: &str) -> Result<RGBColor> {
    let hex = text.trim().trim_start_matches('#');
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
    };
    match (hex.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => Ok(RGBColor(r, g, b)),
        _ => Err(SkylapseError::ConfigError(format!(
            "Invalid colour {text:?}, expected #rrggbb"
        ))),
    }
}

/// Period of the day named in the title
pub fn period_label(hour: u32) -> &'static str {
    if hour >= 19 {
        "Night"
    } else if hour < 7 {
        "Dawn"
    } else {
        "Day"
    }
}

/// The two title lines of a chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartTitle {
    pub heading: String,
    pub subtitle: String,
}

impl ChartTitle {
    pub fn new(place: &str, local: NaiveDateTime) -> Self {
        Self {
            heading: format!("Night sky over {place}"),
            subtitle: format!(
                "{} · {} ({})",
                local.format("%-d %B %Y"),
                local.format("%H:%M"),
                period_label(local.hour())
            ),
        }
    }
}

/// Projected star positions for one frame
///
/// Owns the per-frame coordinates and borrows the catalog-wide magnitudes,
/// so frames never touch shared state.
#[derive(Debug, Clone)]
pub struct SkyView<'a> {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    magnitudes: &'a Array1<f64>,
}

impl<'a> SkyView<'a> {
    pub fn new(x: Array1<f64>, y: Array1<f64>, magnitudes: &'a Array1<f64>) -> Result<Self> {
        if x.len() != magnitudes.len() || y.len() != magnitudes.len() {
            return Err(SkylapseError::RenderError(format!(
                "Projected {}x/{}y positions for {} stars",
                x.len(),
                y.len(),
                magnitudes.len()
            )));
        }
        Ok(Self { x, y, magnitudes })
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    pub fn magnitude(&self, index: usize) -> f64 {
        self.magnitudes[index]
    }

    /// Indices of every star with magnitude <= `limit`, in catalog order
    pub fn visible(&self, limit: f64) -> Vec<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .filter(|(_, &mag)| mag <= limit)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Resolved colours of a style
#[derive(Debug, Clone)]
struct Palette {
    background: RGBColor,
    horizon_fill: RGBColor,
    guide: RGBColor,
    cardinal: RGBColor,
    title: RGBColor,
    tiers: Vec<RGBColor>,
}

impl Palette {
    fn from_style(style: &ChartStyle) -> Result<Self> {
        Ok(Self {
            background: parse_hex_color(&style.background)?,
            horizon_fill: parse_hex_color(&style.horizon_fill)?,
            guide: parse_hex_color(&style.guide_color)?,
            cardinal: parse_hex_color(&style.cardinal_color)?,
            title: parse_hex_color(&style.title_color)?,
            tiers: style
                .tiers
                .iter()
                .map(|tier| parse_hex_color(&tier.color))
                .collect::<Result<_>>()?,
        })
    }
}

type Canvas<'b> = DrawingArea<BitMapBackend<'b>, plotters::coord::Shift>;

fn render_err(e: impl std::fmt::Display) -> SkylapseError {
    SkylapseError::RenderError(e.to_string())
}

/// Renders charts of a fixed size and style
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    style: ChartStyle,
    palette: Palette,
    side: u32,
    band: u32,
}

impl ChartRenderer {
    pub fn new(style: ChartStyle) -> Result<Self> {
        style.validate()?;
        let palette = Palette::from_style(&style)?;
        let side = style.side_px();
        let band = (f64::from(side) * TITLE_BAND).round() as u32;
        Ok(Self {
            style,
            palette,
            side,
            band,
        })
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Width and height of rendered images in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.side, self.side + self.band)
    }

    /// Pixels per projection unit
    fn scale(&self) -> f64 {
        f64::from(self.side) / (2.0 * VIEW_EXTENT)
    }

    fn center_px(&self) -> (f64, f64) {
        let half = f64::from(self.side) / 2.0;
        (half, f64::from(self.band) + half)
    }

    /// Pixel position of a projected point (y up in the projection)
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let (cx, cy) = self.center_px();
        (cx + x * self.scale(), cy - y * self.scale())
    }

    fn to_pixel_i32(&self, x: f64, y: f64) -> (i32, i32) {
        let (px, py) = self.to_pixel(x, y);
        (px.round() as i32, py.round() as i32)
    }

    /// Draw a chart of the stars in `view` no fainter than `limit`
    pub fn render(&self, view: &SkyView, limit: f64, title: &ChartTitle) -> Result<RgbImage> {
        let (width, height) = self.dimensions();
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&self.palette.background).map_err(render_err)?;
            root.draw(&Circle::new(
                self.to_pixel_i32(0.0, 0.0),
                self.scale().round() as u32,
                self.palette.horizon_fill.filled(),
            ))
            .map_err(render_err)?;
            self.draw_stars(&root, view, limit)?;
            root.present().map_err(render_err)?;
        }

        self.clip_to_horizon(&mut buffer);

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            self.draw_guides(&root)?;
            if self.style.show_labels {
                self.draw_labels(&root, title)?;
            }
            root.present().map_err(render_err)?;
        }

        RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| SkylapseError::RenderError("Chart buffer has the wrong size".to_string()))
    }

    fn draw_stars(&self, root: &Canvas, view: &SkyView, limit: f64) -> Result<()> {
        let scale = self.scale();
        let mut visible = view.visible(limit);
        // Faint stars first so bright ones sit on top
        visible.sort_by(|&a, &b| view.magnitude(b).total_cmp(&view.magnitude(a)));

        for i in visible {
            let magnitude = view.magnitude(i);
            let Some(tier_index) = self.style.tiers.iter().position(|t| t.contains(magnitude))
            else {
                continue;
            };
            let alpha = self.style.tiers[tier_index].alpha;
            let color = self.palette.tiers[tier_index];

            let (x, y) = (view.x[i], view.y[i]);
            let radius = self.style.marker_radius_px(magnitude);
            // Entirely below the horizon: clipped anyway
            if !x.is_finite() || !y.is_finite() || x.hypot(y) - radius / scale > 1.0 {
                continue;
            }

            let center = self.to_pixel_i32(x, y);
            if radius >= 1.0 {
                root.draw(&Circle::new(
                    center,
                    radius.round() as u32,
                    color.mix(alpha).filled(),
                ))
                .map_err(render_err)?;
            } else {
                // Sub-pixel marker: one pixel dimmed by its coverage
                let coverage = (PI * radius * radius).min(1.0);
                root.draw_pixel(center, &color.mix(alpha * coverage))
                    .map_err(render_err)?;
            }
        }
        Ok(())
    }

    /// Restore the background outside the horizon circle
    fn clip_to_horizon(&self, buffer: &mut [u8]) {
        let (width, _) = self.dimensions();
        let (cx, cy) = self.center_px();
        let radius_sq = self.scale() * self.scale();
        let RGBColor(r, g, b) = self.palette.background;

        for (i, pixel) in buffer.chunks_exact_mut(3).enumerate() {
            let px = (i % width as usize) as f64 + 0.5 - cx;
            let py = (i / width as usize) as f64 + 0.5 - cy;
            if px * px + py * py > radius_sq {
                pixel.copy_from_slice(&[r, g, b]);
            }
        }
    }

    fn draw_guides(&self, root: &Canvas) -> Result<()> {
        let line_width = self.style.points_to_px(GUIDE_LINE_WIDTH_PT).round().max(1.0) as u32;
        // Dash pattern of 3.7 on, 1.6 off, in line widths
        let dash = self.style.points_to_px(3.7 * GUIDE_LINE_WIDTH_PT);
        let gap = self.style.points_to_px(1.6 * GUIDE_LINE_WIDTH_PT);

        for (altitude, alpha) in GUIDE_CIRCLES {
            let radius = altitude_radius(altitude);
            let circumference = 2.0 * PI * radius * self.scale();
            let dashes = ((circumference / (dash + gap)).round() as usize).max(8);
            let step = 2.0 * PI / dashes as f64;
            let style = self.palette.guide.mix(alpha).stroke_width(line_width);

            for k in 0..dashes {
                let start = k as f64 * step;
                let sweep = step * dash / (dash + gap);
                let points: Vec<(i32, i32)> = (0..=6)
                    .map(|j| {
                        let theta = start + sweep * j as f64 / 6.0;
                        self.to_pixel_i32(radius * theta.cos(), radius * theta.sin())
                    })
                    .collect();
                root.draw(&PathElement::new(points, style))
                    .map_err(render_err)?;
            }
        }
        Ok(())
    }

    fn draw_labels(&self, root: &Canvas, title: &ChartTitle) -> Result<()> {
        let centered = Pos::new(HPos::Center, VPos::Center);

        let guide_font = ("sans-serif", self.style.points_to_px(9.0))
            .into_font()
            .color(&self.palette.guide.mix(0.4))
            .pos(centered);
        for altitude in [30.0, 60.0] {
            let y = altitude_radius(altitude) + 0.03;
            root.draw(&Text::new(
                format!("{altitude:.0}°"),
                self.to_pixel_i32(0.0, y),
                guide_font.clone(),
            ))
            .map_err(render_err)?;
        }

        let cardinal_font = ("sans-serif", self.style.points_to_px(14.0), FontStyle::Bold)
            .into_font()
            .color(&self.palette.cardinal.mix(0.7))
            .pos(centered);
        // Looking up with north at the top puts east on the left
        for (label, x, y) in [
            ("N", 0.0, 1.05),
            ("S", 0.0, -1.05),
            ("E", -1.05, 0.0),
            ("W", 1.05, 0.0),
        ] {
            root.draw(&Text::new(
                label,
                self.to_pixel_i32(x, y),
                cardinal_font.clone(),
            ))
            .map_err(render_err)?;
        }

        let title_font = ("sans-serif", self.style.points_to_px(18.0), FontStyle::Bold)
            .into_font()
            .color(&self.palette.title)
            .pos(centered);
        let middle = (self.side / 2) as i32;
        let band = f64::from(self.band);
        for (line, fraction) in [(&title.heading, 0.35), (&title.subtitle, 0.75)] {
            root.draw(&Text::new(
                line.as_str(),
                (middle, (band * fraction).round() as i32),
                title_font.clone(),
            ))
            .map_err(render_err)?;
        }
        Ok(())
    }
}

/// Write a chart image as PNG
pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| match e {
            image::ImageError::IoError(io) => SkylapseError::IoError(io),
            other => SkylapseError::RenderError(format!("{}: {other}", path.display())),
        })
}
