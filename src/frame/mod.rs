//! Per-instant chart generation
//!
//! For each scheduled instant the generator finds the observer's zenith,
//! centres a stereographic projection on it, projects the whole star field
//! and rasterises a chart into the frame directory.

use chrono::Timelike;

use crate::earthlib::Wgs84Position;
use crate::frames_dir::FrameDirectory;
use crate::planetlib::EarthPosition;
use crate::positions::StarField;
use crate::projection::StereographicProjection;
use crate::render::{save_png, ChartRenderer, ChartTitle, SkyView};
use crate::schedule::FrameInstant;
use crate::time::{Time, Timescale};
use crate::Result;
use image::RgbImage;

/// Progress report for frame `index` of `total`, or `None` when the frame
/// is not reported (only the first, every third and the last are)
pub fn progress_line(index: usize, total: usize, instant: &FrameInstant) -> Option<String> {
    let last = index + 1 == total;
    if index != 0 && index % 3 != 0 && !last {
        return None;
    }
    let pct = (index + 1) * 100 / total.max(1);
    Some(format!(
        "[{pct:3}%] Frame {}/{total} - {:02}:{:02}",
        index + 1,
        instant.local.hour(),
        instant.local.minute()
    ))
}

/// Renders one chart per instant for a fixed site and star field
pub struct FrameGenerator<'a, E: EarthPosition> {
    stars: &'a StarField,
    earth: &'a E,
    observer: Wgs84Position,
    renderer: ChartRenderer,
    place: String,
    limiting_magnitude: f64,
    timescale: Timescale,
}

impl<'a, E: EarthPosition> FrameGenerator<'a, E> {
    pub fn new(
        stars: &'a StarField,
        earth: &'a E,
        observer: Wgs84Position,
        renderer: ChartRenderer,
        place: impl Into<String>,
        limiting_magnitude: f64,
    ) -> Self {
        Self {
            stars,
            earth,
            observer,
            renderer,
            place: place.into(),
            limiting_magnitude,
            timescale: Timescale::default(),
        }
    }

    pub fn renderer(&self) -> &ChartRenderer {
        &self.renderer
    }

    /// Zenith-centred projection for the observer at `t`
    pub fn projection(&self, t: &Time) -> StereographicProjection {
        let zenith = self.observer.zenith_radec(t).unit_vector();
        StereographicProjection::centered_on(&zenith)
    }

    /// Project every star as seen from the geocenter at `t`
    pub fn sky_view(&self, t: &Time) -> Result<SkyView<'a>> {
        let earth = self.earth.earth_barycentric(t)?;
        let positions = self.stars.observe(&earth, t);
        let (x, y) = self.projection(t).project_array(&positions);
        SkyView::new(x, y, self.stars.magnitudes())
    }

    /// Render the chart for one instant
    pub fn render(&self, instant: &FrameInstant) -> Result<RgbImage> {
        let t = self.timescale.from_datetime(instant.utc);
        let view = self.sky_view(&t)?;
        log::debug!(
            "Frame {} at {} ({} of {} stars visible)",
            instant.index,
            instant.utc,
            view.visible(self.limiting_magnitude).len(),
            view.len()
        );
        let title = ChartTitle::new(&self.place, instant.local);
        self.renderer.render(&view, self.limiting_magnitude, &title)
    }

    /// Render every instant in order into `frames`, printing progress
    ///
    /// Stops at the first failure.
    pub fn render_all(&self, instants: &[FrameInstant], frames: &mut FrameDirectory) -> Result<()> {
        let total = instants.len();
        for instant in instants {
            let image = self.render(instant)?;
            let path = frames.frame_path(instant.index);
            save_png(&image, &path)?;
            frames.record(path);

            if let Some(line) = progress_line(instant.index, total, instant) {
                println!("{line}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogs::HipparcosCatalog;
    use crate::location::Location;
    use crate::planetlib::FixedEarth;
    use crate::render::ChartStyle;
    use crate::schedule::TimeWindow;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use nalgebra::Vector3;

    fn small_style() -> ChartStyle {
        ChartStyle {
            chart_size: 2.0,
            dpi: 100,
            show_labels: false,
            ..ChartStyle::default()
        }
    }

    fn artieda() -> Location {
        Location::new("Artieda", 42.58, -0.98, chrono_tz::Europe::Madrid)
    }

    fn instants(interval: u32) -> Vec<FrameInstant> {
        let window = TimeWindow::new(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(), 19, 7, interval);
        window.instants(&artieda())
    }

    fn earth() -> FixedEarth {
        FixedEarth(Vector3::new(-0.98, 0.17, 0.07))
    }

    #[test]
    fn test_progress_cadence() {
        let instants = instants(60);
        let reported: Vec<usize> = instants
            .iter()
            .filter_map(|i| progress_line(i.index, instants.len(), i).map(|_| i.index))
            .collect();
        assert_eq!(reported, vec![0, 3, 6, 9, 11]);

        assert_eq!(
            progress_line(0, 12, &instants[0]).unwrap(),
            "[  8%] Frame 1/12 - 19:00"
        );
        assert_eq!(
            progress_line(11, 12, &instants[11]).unwrap(),
            "[100%] Frame 12/12 - 06:00"
        );
    }

    #[test]
    fn test_zenith_projects_to_centre() {
        let catalog = HipparcosCatalog::create_synthetic();
        let stars = StarField::from_catalog(&catalog);
        let earth = earth();
        let observer = artieda().observer().unwrap();
        let generator = FrameGenerator::new(
            &stars,
            &earth,
            observer,
            ChartRenderer::new(small_style()).unwrap(),
            "Artieda",
            9.0,
        );

        let t = Timescale::default().from_datetime(instants(60)[3].utc);
        let zenith = observer.zenith_radec(&t).unit_vector();
        let (x, y) = generator.projection(&t).project(&zenith);
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sky_view_follows_catalog_order() {
        let catalog = HipparcosCatalog::create_synthetic();
        let stars = StarField::from_catalog(&catalog);
        let earth = earth();
        let generator = FrameGenerator::new(
            &stars,
            &earth,
            artieda().observer().unwrap(),
            ChartRenderer::new(small_style()).unwrap(),
            "Artieda",
            9.0,
        );

        let t = Timescale::default().from_datetime(instants(60)[0].utc);
        let view = generator.sky_view(&t).unwrap();
        assert_eq!(view.len(), catalog.entries().len());
        assert_eq!(view.magnitude(0), catalog.entries()[0].mag);
        assert_eq!(view.visible(9.0).len(), catalog.entries().len());
        assert!(view.visible(0.0).len() < view.visible(2.0).len());
        // Polaris stays well above the horizon from 42.6 N
        let polaris = catalog.entries().iter().position(|e| e.hip == 11767).unwrap();
        let r = view.x[polaris].hypot(view.y[polaris]);
        assert!(r < 0.7, "Polaris at radius {r}");
    }

    #[test]
    fn test_sky_turns_between_frames() {
        let catalog = HipparcosCatalog::create_synthetic();
        let stars = StarField::from_catalog(&catalog);
        let earth = earth();
        let generator = FrameGenerator::new(
            &stars,
            &earth,
            artieda().observer().unwrap(),
            ChartRenderer::new(small_style()).unwrap(),
            "Artieda",
            9.0,
        );
        let ts = Timescale::default();
        let instants = instants(60);
        let a = generator.sky_view(&ts.from_datetime(instants[0].utc)).unwrap();
        let b = generator.sky_view(&ts.from_datetime(instants[1].utc)).unwrap();
        assert!((a.x[0] - b.x[0]).abs() + (a.y[0] - b.y[0]).abs() > 1e-3);
    }

    #[test]
    fn test_render_all_writes_numbered_frames() {
        let catalog = HipparcosCatalog::create_synthetic();
        let stars = StarField::from_catalog(&catalog);
        let earth = earth();
        let renderer = ChartRenderer::new(small_style()).unwrap();
        let dimensions = renderer.dimensions();
        let generator = FrameGenerator::new(
            &stars,
            &earth,
            artieda().observer().unwrap(),
            renderer,
            "Artieda",
            6.0,
        );

        let parent = tempfile::tempdir().unwrap();
        let mut frames = FrameDirectory::create(parent.path(), "temp_frames").unwrap();
        let instants = &instants(180)[..3];
        generator.render_all(instants, &mut frames).unwrap();

        assert_eq!(frames.frames().len(), 3);
        for (i, path) in frames.frames().iter().enumerate() {
            assert!(path.ends_with(format!("frame_{i:03}.png")));
            let image = image::open(path).unwrap();
            assert_eq!((image.width(), image.height()), dimensions);
        }
        assert_eq!(frames.cleanup().unwrap(), 3);
    }
}
