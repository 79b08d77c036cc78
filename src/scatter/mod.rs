// src/scatter/mod.rs
//! Position scatter plot engine
//!
//! Maintains a bounded history of position fixes, derives running mean and
//! standard deviation, and projects the points onto a canvas through a
//! rectangular bounding box centered on either the cumulative average or a
//! user-supplied fixed reference. Autorange widens the visible radius until
//! every retained point fits.

pub mod geo;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::ScatterConfig;
use crate::display::canvas::{Anchor, Canvas, FIXED, FOREGROUND, POINT};
use crate::gps::sentence::FixQuality;
use crate::gps::status::GnssStatus;
use geo::{in_bounds, point_at_vector, pstdev, Area, Point};

/// Plot radii in meters, largest first. The scale index selects the
/// distance from plot center to the visible edge.
pub const SCALE_FACTORS: [f64; 18] = [
    5000.0, 2000.0, 1000.0, 500.0, 200.0, 100.0, 50.0, 20.0, 10.0, 5.0, 2.0, 1.0, 0.5, 0.2, 0.1,
    0.05, 0.02, 0.01,
];

/// Default retained point capacity, roughly 24 hours of 1 Hz data.
pub const MAX_POINTS: usize = 100_000;

const POINT_RADIUS: f64 = 2.0;
const FIXED_RADIUS: f64 = 3.0;
const LABEL_LINE_HEIGHT: f64 = 14.0;
const LABEL_MARGIN: f64 = 5.0;
// sin(45 deg), for placing ring labels on the diagonal
const DIAG: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// What the plot is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterMode {
    #[default]
    Average,
    Fixed,
}

/// Derived statistics snapshot for passive displays.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScatterSummary {
    pub point_count: usize,
    pub average: Option<Point>,
    pub stddev: Option<Point>,
    /// Current plot radius in meters
    pub range_m: f64,
    pub scale_index: usize,
}

pub struct ScatterEngine {
    points: VecDeque<Point>,
    capacity: usize,
    average: Option<Point>,
    stddev: Option<Point>,
    fixed: Option<Point>,
    bounds: Option<Area>,
    last_bounds: Area,
    range: f64,
    scale: usize,
    autorange: bool,
    center_mode: CenterMode,
    ref_lat: String,
    ref_lon: String,
}

impl ScatterEngine {
    pub fn new() -> Self {
        Self::with_capacity(MAX_POINTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: VecDeque::new(),
            capacity,
            average: None,
            stddev: None,
            fixed: None,
            bounds: None,
            last_bounds: Area::default(),
            range: 0.0,
            scale: 9,
            autorange: true,
            center_mode: CenterMode::Average,
            ref_lat: String::new(),
            ref_lon: String::new(),
        }
    }

    pub fn from_config(config: &ScatterConfig) -> Self {
        let mut engine = Self::with_capacity(config.max_points);
        engine.autorange = config.autorange;
        engine.scale = config.scale_index.min(SCALE_FACTORS.len() - 1);
        engine.center_mode = config.center_mode;
        // A zero reference means "not set", matching the persisted format
        if config.reference_lat != 0.0 || config.reference_lon != 0.0 {
            engine.ref_lat = format!("{:.9}", config.reference_lat);
            engine.ref_lon = format!("{:.9}", config.reference_lon);
        }
        engine
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    pub fn average(&self) -> Option<Point> {
        self.average
    }

    pub fn stddev(&self) -> Option<Point> {
        self.stddev
    }

    pub fn bounds(&self) -> Option<Area> {
        self.bounds
    }

    pub fn scale_index(&self) -> usize {
        self.scale
    }

    pub fn center_mode(&self) -> CenterMode {
        self.center_mode
    }

    pub fn set_center_mode(&mut self, mode: CenterMode) {
        self.center_mode = mode;
    }

    pub fn set_autorange(&mut self, autorange: bool) {
        self.autorange = autorange;
    }

    /// Set the fixed reference from text input; parsed on the next update.
    pub fn set_reference(&mut self, lat: &str, lon: &str) {
        self.ref_lat = lat.to_string();
        self.ref_lon = lon.to_string();
    }

    /// One step toward a smaller radius.
    pub fn zoom_in(&mut self) {
        if self.scale < SCALE_FACTORS.len() - 1 {
            self.scale += 1;
        }
    }

    /// One step toward a larger radius.
    pub fn zoom_out(&mut self) {
        if self.scale > 0 {
            self.scale -= 1;
        }
    }

    pub fn set_scale_index(&mut self, index: usize) {
        self.scale = index.min(SCALE_FACTORS.len() - 1);
    }

    /// Drop the retained history.
    pub fn clear(&mut self) {
        self.points.clear();
        self.average = None;
        self.stddev = None;
    }

    /// Center on a clicked canvas position by making it the fixed reference.
    pub fn recenter(&mut self, xy: (f64, f64), canvas_size: (f64, f64)) {
        if let Some(pos) = self.xy2ll(canvas_size, xy) {
            self.ref_lat = format!("{:.9}", pos.lat);
            self.ref_lon = format!("{:.9}", pos.lon);
            self.fixed = Some(Point::new(pos.lat, pos.lon));
            self.center_mode = CenterMode::Fixed;
        }
    }

    pub fn summary(&self) -> ScatterSummary {
        ScatterSummary {
            point_count: self.points.len(),
            average: self.average,
            stddev: self.stddev,
            range_m: self.range,
            scale_index: self.scale,
        }
    }

    /// Fold the current fix into the plot. Invoked once per fix update and
    /// a no-op whenever there is nothing usable to plot.
    pub fn update(&mut self, status: &GnssStatus, canvas: &mut dyn Canvas) {
        if !status.lat.is_finite() || !status.lon.is_finite() {
            return;
        }
        if status.fix == FixQuality::NoFix {
            return;
        }
        let pos = Point::new(status.lat, status.lon);
        if self.points.back() == Some(&pos) {
            // Unchanged fix: skip to avoid statistical skew and redraw churn
            return;
        }

        self.points.push_back(pos);
        if self.points.len() > self.capacity {
            self.points.pop_front();
        }

        self.set_average();

        // Average always exists here since at least one point was appended
        let mut middle = self.average.unwrap_or(pos);
        match (self.ref_lat.parse::<f64>(), self.ref_lon.parse::<f64>()) {
            (Ok(lat), Ok(lon)) => {
                self.fixed = Some(Point::new(lat, lon));
                if self.center_mode == CenterMode::Fixed {
                    middle = Point::new(lat, lon);
                }
            }
            _ => {
                self.fixed = None;
                self.center_mode = CenterMode::Average;
            }
        }

        self.set_bounds(middle, canvas);
        if self.autorange {
            self.do_autorange(middle, canvas);
        }

        self.redraw(canvas);
    }

    /// Convert lat/lon to canvas x/y within the current bounds.
    pub fn ll2xy(&self, canvas_size: (f64, f64), pos: Point) -> Option<(f64, f64)> {
        let bounds = self.bounds?;
        let (cw, ch) = canvas_size;
        let lon_per_px = bounds.width() / cw;
        let lat_per_px = bounds.height() / ch;

        let x = (pos.lon - bounds.lon1) / lon_per_px;
        // Canvas y grows downward, latitude grows upward
        let y = ch - (pos.lat - bounds.lat1) / lat_per_px;
        Some((x, y))
    }

    /// Exact algebraic inverse of [`ll2xy`](Self::ll2xy).
    pub fn xy2ll(&self, canvas_size: (f64, f64), xy: (f64, f64)) -> Option<Point> {
        let bounds = self.bounds?;
        let (cw, ch) = canvas_size;
        let px_per_lon = cw / bounds.width();
        let px_per_lat = ch / bounds.height();

        let lon = bounds.lon1 + xy.0 / px_per_lon;
        let lat = bounds.lat1 + (ch - xy.1) / px_per_lat;
        Some(Point::new(lat, lon))
    }

    /// Current range value scaled to display units.
    pub fn range_label(&self) -> (f64, &'static str) {
        if self.range >= 1000.0 {
            (self.range / 1000.0, "km")
        } else if self.range >= 1.0 {
            (self.range, "m")
        } else {
            (self.range * 100.0, "cm")
        }
    }

    fn set_average(&mut self) {
        let num = self.points.len();
        if num == 0 {
            self.average = None;
            self.stddev = None;
            return;
        }
        let avg_lat = self.points.iter().map(|p| p.lat).sum::<f64>() / num as f64;
        let avg_lon = self.points.iter().map(|p| p.lon).sum::<f64>() / num as f64;
        // Mean of raw degrees; distorted near the poles, accepted limitation
        self.average = Some(Point::new(avg_lat, avg_lon));
        self.stddev = match (
            pstdev(self.points.iter().map(|p| p.lat)),
            pstdev(self.points.iter().map(|p| p.lon)),
        ) {
            (Some(lat), Some(lon)) => Some(Point::new(lat, lon)),
            _ => None,
        };
    }

    /// Derive the bounding box from the center point and the scale radius.
    /// The east/west distance is stretched by the canvas aspect ratio so
    /// both axes represent equal physical distance per pixel.
    fn set_bounds(&mut self, center: Point, canvas: &mut dyn Canvas) {
        let (cw, ch) = canvas.size();
        let dist_v = SCALE_FACTORS[self.scale];
        let dist_h = dist_v * cw / ch;
        let top = point_at_vector(center, dist_v, 0.0);
        let right = point_at_vector(center, dist_h, 90.0);
        let bottom = point_at_vector(center, dist_v, 180.0);
        let left = point_at_vector(center, dist_h, 270.0);
        let bounds = Area::new(bottom.lat, left.lon, top.lat, right.lon);
        self.bounds = Some(bounds);
        self.range = dist_v;

        // The static frame depends only on the box, so only a material
        // change forces a full redraw
        if bounds != self.last_bounds {
            self.draw_frame(canvas);
            self.last_bounds = bounds;
        }
    }

    /// Zoom out one step at a time until every retained point is inside the
    /// bounding box or the largest radius is reached. Zooming back in is
    /// left to the user so the range never oscillates.
    fn do_autorange(&mut self, center: Point, canvas: &mut dyn Canvas) {
        let mut out = true;
        while out && self.scale > 0 {
            let bounds = match self.bounds {
                Some(b) => b,
                None => return,
            };
            out = self.points.iter().any(|p| !in_bounds(&bounds, *p));
            if out {
                self.scale -= 1;
                self.set_bounds(center, canvas);
            }
        }
    }

    /// Draw the static compass frame: crosshairs, range rings, ring
    /// distance labels and cardinal labels.
    fn draw_frame(&self, canvas: &mut dyn Canvas) {
        let (width, height) = canvas.size();
        canvas.clear();
        canvas.line((0.0, height / 2.0), (width, height / 2.0), FOREGROUND);
        canvas.line((width / 2.0, 0.0), (width / 2.0, height), FOREGROUND);

        let max_r = (width / 2.0).min(height / 2.0);
        let (rng, unit) = self.range_label();
        let dp = if rng >= 100.0 {
            0
        } else if rng >= 10.0 {
            1
        } else if rng >= 1.0 {
            2
        } else {
            3
        };

        for i in 1..=4 {
            let frac = i as f64 / 4.0;
            canvas.circle(
                (width / 2.0, height / 2.0),
                max_r * frac,
                FOREGROUND,
                false,
            );
            let dist = format!("{:.*}{}", dp, rng * frac, unit);
            let txt_x = width / 2.0 + DIAG * max_r * frac;
            let txt_y = height / 2.0 + DIAG * max_r * frac;
            canvas.text((txt_x, txt_y), &dist, FOREGROUND, Anchor::Center);
        }

        for (x, y, label, anchor) in [
            (width / 2.0, LABEL_MARGIN, "N", Anchor::North),
            (width / 2.0, height - LABEL_MARGIN, "S", Anchor::South),
            (LABEL_MARGIN, height / 2.0, "W", Anchor::West),
            (width - LABEL_MARGIN, height / 2.0, "E", Anchor::East),
        ] {
            canvas.text((x, y), label, FOREGROUND, anchor);
        }
    }

    /// Draw every retained point, the fixed reference marker and the
    /// average/stddev annotation.
    fn redraw(&self, canvas: &mut dyn Canvas) {
        if self.points.is_empty() {
            return;
        }

        for point in &self.points {
            self.draw_point(canvas, *point, POINT, POINT_RADIUS);
        }
        if let Some(fixed) = self.fixed {
            self.draw_point(canvas, fixed, FIXED, FIXED_RADIUS);
        }

        self.draw_average(canvas);
    }

    fn draw_point(
        &self,
        canvas: &mut dyn Canvas,
        pos: Point,
        color: crate::display::canvas::Color,
        radius: f64,
    ) {
        let bounds = match self.bounds {
            Some(b) => b,
            None => return,
        };
        // Out-of-bounds points are skipped, not clipped
        if !in_bounds(&bounds, pos) {
            return;
        }
        if let Some(xy) = self.ll2xy(canvas.size(), pos) {
            canvas.circle(xy, radius, color, true);
        }
    }

    fn draw_average(&self, canvas: &mut dyn Canvas) {
        let average = match self.average {
            Some(a) => a,
            None => return,
        };
        let avg = format!("Avg: {:.9}, {:.9}", average.lat, average.lon);
        canvas.text(
            (LABEL_MARGIN, LABEL_MARGIN),
            &avg,
            POINT,
            Anchor::NorthWest,
        );
        if let Some(stddev) = self.stddev {
            let std = format!("Std: {:.3e}, {:.3e}", stddev.lat, stddev.lon);
            canvas.text(
                (LABEL_MARGIN, LABEL_MARGIN + LABEL_LINE_HEIGHT),
                &std,
                POINT,
                Anchor::NorthWest,
            );
        }
    }
}

impl Default for ScatterEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::canvas::RecordingCanvas;

    fn status(lat: f64, lon: f64) -> GnssStatus {
        GnssStatus {
            lat,
            lon,
            fix: FixQuality::Fix3d,
            ..GnssStatus::new()
        }
    }

    fn canvas() -> RecordingCanvas {
        RecordingCanvas::new(500.0, 500.0)
    }

    #[test]
    fn test_no_fix_and_non_finite_are_noops() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();

        let mut no_fix = status(51.5, -0.1);
        no_fix.fix = FixQuality::NoFix;
        engine.update(&no_fix, &mut canvas);
        assert_eq!(engine.point_count(), 0);

        engine.update(&status(f64::NAN, -0.1), &mut canvas);
        assert_eq!(engine.point_count(), 0);
    }

    #[test]
    fn test_consecutive_duplicates_suppressed() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();

        engine.update(&status(10.0, 10.0), &mut canvas);
        engine.update(&status(10.0, 10.0), &mut canvas);
        engine.update(&status(10.1, 10.1), &mut canvas);

        assert_eq!(engine.point_count(), 2);

        // Non-consecutive repeats are allowed
        engine.update(&status(10.0, 10.0), &mut canvas);
        assert_eq!(engine.point_count(), 3);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let mut engine = ScatterEngine::with_capacity(3);
        let mut canvas = canvas();

        for i in 0..5 {
            engine.update(&status(50.0 + i as f64 * 0.001, 0.0), &mut canvas);
        }

        assert_eq!(engine.point_count(), 3);
        let first = engine.points().next().unwrap();
        assert!((first.lat - 50.002).abs() < 1e-12);
    }

    #[test]
    fn test_average_and_stddev() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();

        engine.update(&status(50.0, 10.0), &mut canvas);
        engine.update(&status(50.002, 10.002), &mut canvas);

        let average = engine.average().unwrap();
        assert!((average.lat - 50.001).abs() < 1e-9);
        assert!((average.lon - 10.001).abs() < 1e-9);

        let stddev = engine.stddev().unwrap();
        assert!((stddev.lat - 0.001).abs() < 1e-9);
        assert!((stddev.lon - 0.001).abs() < 1e-9);
    }

    #[test]
    fn test_projection_round_trip() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_autorange(false);
        engine.update(&status(51.5, -0.1), &mut canvas);

        let bounds = engine.bounds().unwrap();
        let size = (500.0, 500.0);
        for (lat, lon) in [
            (51.5, -0.1),
            (bounds.lat1, bounds.lon1),
            (bounds.lat2, bounds.lon2),
            ((bounds.lat1 + bounds.lat2) / 2.0, bounds.lon1),
        ] {
            let p = Point::new(lat, lon);
            let xy = engine.ll2xy(size, p).unwrap();
            let back = engine.xy2ll(size, xy).unwrap();
            assert!((back.lat - p.lat).abs() < 1e-9, "lat {} -> {}", p.lat, back.lat);
            assert!((back.lon - p.lon).abs() < 1e-9, "lon {} -> {}", p.lon, back.lon);
        }
    }

    #[test]
    fn test_center_point_maps_to_canvas_center() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_autorange(false);
        engine.update(&status(51.5, -0.1), &mut canvas);

        let (x, y) = engine.ll2xy((500.0, 500.0), Point::new(51.5, -0.1)).unwrap();
        assert!((x - 250.0).abs() < 1.0);
        assert!((y - 250.0).abs() < 1.0);
    }

    #[test]
    fn test_autorange_zooms_out_until_points_fit() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        // Smallest radius (0.01 m) cannot contain points ~150 m apart
        engine.set_scale_index(SCALE_FACTORS.len() - 1);

        engine.update(&status(51.5, -0.1), &mut canvas);
        engine.update(&status(51.501, -0.1), &mut canvas);

        let bounds = engine.bounds().unwrap();
        assert!(engine.points().all(|p| in_bounds(&bounds, p)));
        // Points sit ~55.6 m either side of the average, so the 100 m
        // radius is the first that fits
        assert_eq!(engine.scale_index(), 5);
        assert_eq!(SCALE_FACTORS[engine.scale_index()], 100.0);
    }

    #[test]
    fn test_autorange_terminates_at_largest_radius() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_scale_index(SCALE_FACTORS.len() - 1);

        // Points further apart than the 5000 m maximum radius
        engine.update(&status(51.5, -0.1), &mut canvas);
        engine.update(&status(52.5, -0.1), &mut canvas);

        assert_eq!(engine.scale_index(), 0);
    }

    #[test]
    fn test_autorange_disabled_keeps_scale() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_autorange(false);
        engine.set_scale_index(SCALE_FACTORS.len() - 1);

        engine.update(&status(51.5, -0.1), &mut canvas);
        engine.update(&status(51.6, -0.1), &mut canvas);

        assert_eq!(engine.scale_index(), SCALE_FACTORS.len() - 1);
    }

    #[test]
    fn test_fixed_reference_parse_failure_falls_back_to_average() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_reference("not a number", "also not");
        engine.set_center_mode(CenterMode::Fixed);

        engine.update(&status(51.5, -0.1), &mut canvas);

        assert_eq!(engine.center_mode(), CenterMode::Average);
        assert!(engine.summary().average.is_some());
    }

    #[test]
    fn test_fixed_reference_centers_plot() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_reference("51.6", "-0.2");
        engine.set_center_mode(CenterMode::Fixed);
        engine.set_autorange(false);

        engine.update(&status(51.6, -0.2), &mut canvas);

        let bounds = engine.bounds().unwrap();
        let mid_lat = (bounds.lat1 + bounds.lat2) / 2.0;
        let mid_lon = (bounds.lon1 + bounds.lon2) / 2.0;
        assert!((mid_lat - 51.6).abs() < 1e-6);
        assert!((mid_lon - -0.2).abs() < 1e-6);
        assert_eq!(engine.center_mode(), CenterMode::Fixed);
    }

    #[test]
    fn test_recenter_sets_fixed_reference() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.update(&status(51.5, -0.1), &mut canvas);

        engine.recenter((250.0, 250.0), (500.0, 500.0));

        assert_eq!(engine.center_mode(), CenterMode::Fixed);
        let fixed = engine.summary();
        assert_eq!(fixed.point_count, 1);
    }

    #[test]
    fn test_range_label_units_and_frame_labels() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.set_autorange(false);

        // Index 0 = 5000 m -> km
        engine.set_scale_index(0);
        engine.update(&status(51.5, -0.1), &mut canvas);
        assert_eq!(engine.range_label(), (5.0, "km"));
        assert!(canvas.texts().any(|t| t == "5.00km"));
        assert!(canvas.texts().any(|t| t == "1.25km"));
        assert!(canvas.texts().any(|t| t == "N"));

        // Index 5 = 100 m -> m with no decimals
        engine.set_scale_index(5);
        engine.update(&status(51.6, -0.1), &mut canvas);
        assert_eq!(engine.range_label(), (100.0, "m"));
        assert!(canvas.texts().any(|t| t == "100m"));
        assert!(canvas.texts().any(|t| t == "25m"));

        // Index 14 = 0.1 m -> cm
        engine.set_scale_index(14);
        engine.update(&status(51.7, -0.1), &mut canvas);
        assert_eq!(engine.range_label(), (10.0, "cm"));
        assert!(canvas.texts().any(|t| t == "10.0cm"));
    }

    #[test]
    fn test_redraw_emits_point_markers_and_average_text() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();

        engine.update(&status(51.5, -0.1), &mut canvas);

        let filled_points = canvas
            .circles()
            .filter(|p| matches!(p, crate::display::canvas::Primitive::Circle { fill: true, color, .. } if *color == POINT))
            .count();
        assert_eq!(filled_points, 1);
        assert!(canvas.texts().any(|t| t.starts_with("Avg: ")));
        assert!(canvas.texts().any(|t| t.starts_with("Std: ")));
    }

    #[test]
    fn test_clear_drops_history() {
        let mut engine = ScatterEngine::new();
        let mut canvas = canvas();
        engine.update(&status(51.5, -0.1), &mut canvas);
        engine.clear();
        assert_eq!(engine.point_count(), 0);
        assert!(engine.average().is_none());
    }
}
