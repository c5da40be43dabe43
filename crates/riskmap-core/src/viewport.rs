//! Map viewport geometry.
//!
//! Bounds are plain degree rectangles. Nothing here validates that they are
//! geographically sensible beyond keeping north > south and east > west.

use serde::{Deserialize, Serialize};

use crate::PropertyRecord;

/// Padding applied to a zero-height or zero-width rectangle, in degrees.
pub const DEGENERATE_PAD: f64 = 0.05;

/// Zoom used when a single location is shown.
pub const SINGLE_LOCATION_ZOOM: u8 = 12;

/// Upper zoom limit when fitting several locations.
pub const MAX_FIT_ZOOM: u8 = 12;

/// Fraction of the span added on each side when fitting several locations.
const FIT_PADDING: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Command for the map controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapView {
    /// Fit to a rectangle, never zooming past `max_zoom`.
    Bounds {
        bounds: ViewportBounds,
        max_zoom: u8,
    },
    /// Center on a point.
    Center { lat: f64, lon: f64, zoom: u8 },
    /// Leave the map where it is.
    Unchanged,
}

impl ViewportBounds {
    /// Widen any zero-size axis by [`DEGENERATE_PAD`] on both sides.
    pub fn padded(self) -> Self {
        let mut b = self;
        if b.north == b.south {
            b.north += DEGENERATE_PAD;
            b.south -= DEGENERATE_PAD;
        }
        if b.east == b.west {
            b.east += DEGENERATE_PAD;
            b.west -= DEGENERATE_PAD;
        }
        b
    }
}

/// Derive a map view that encloses the given records.
///
/// Records without coordinates are skipped.
pub fn fit_records<'a, I>(records: I) -> MapView
where
    I: IntoIterator<Item = &'a PropertyRecord>,
{
    let points: Vec<(f64, f64)> = records
        .into_iter()
        .filter_map(PropertyRecord::coordinates)
        .collect();

    match points.as_slice() {
        [] => MapView::Unchanged,
        [(lat, lon)] => MapView::Center {
            lat: *lat,
            lon: *lon,
            zoom: SINGLE_LOCATION_ZOOM,
        },
        _ => {
            let mut b = ViewportBounds {
                north: f64::MIN,
                south: f64::MAX,
                east: f64::MIN,
                west: f64::MAX,
            };
            for &(lat, lon) in &points {
                b.north = b.north.max(lat);
                b.south = b.south.min(lat);
                b.east = b.east.max(lon);
                b.west = b.west.min(lon);
            }
            let lat_pad = ((b.north - b.south) * FIT_PADDING).max(DEGENERATE_PAD);
            let lon_pad = ((b.east - b.west) * FIT_PADDING).max(DEGENERATE_PAD);
            MapView::Bounds {
                bounds: ViewportBounds {
                    north: b.north + lat_pad,
                    south: b.south - lat_pad,
                    east: b.east + lon_pad,
                    west: b.west - lon_pad,
                },
                max_zoom: MAX_FIT_ZOOM,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> PropertyRecord {
        PropertyRecord {
            lat: Some(lat),
            lon: Some(lon),
            ..Default::default()
        }
    }

    #[test]
    fn point_bounds_are_padded() {
        let b = ViewportBounds {
            north: 40.0,
            south: 40.0,
            east: -73.0,
            west: -73.0,
        }
        .padded();
        assert!(b.north > b.south);
        assert!(b.east > b.west);
        assert!((b.north - 40.05).abs() < 1e-9);
        assert!((b.west - -73.05).abs() < 1e-9);
    }

    #[test]
    fn non_degenerate_bounds_untouched() {
        let b = ViewportBounds {
            north: 41.0,
            south: 40.0,
            east: -72.0,
            west: -73.0,
        };
        assert_eq!(b.padded(), b);
    }

    #[test]
    fn single_axis_padding() {
        let b = ViewportBounds {
            north: 41.0,
            south: 40.0,
            east: -73.0,
            west: -73.0,
        }
        .padded();
        assert_eq!(b.north, 41.0);
        assert_eq!(b.south, 40.0);
        assert!(b.east > b.west);
    }

    #[test]
    fn no_records_leaves_map() {
        let none: [PropertyRecord; 0] = [];
        assert_eq!(fit_records(&none), MapView::Unchanged);
        assert_eq!(fit_records(&[PropertyRecord::default()]), MapView::Unchanged);
    }

    #[test]
    fn single_record_centers() {
        let view = fit_records(&[at(25.0, -80.0)]);
        assert_eq!(
            view,
            MapView::Center {
                lat: 25.0,
                lon: -80.0,
                zoom: SINGLE_LOCATION_ZOOM
            }
        );
    }

    #[test]
    fn several_records_fit_padded_box() {
        let view = fit_records(&[at(25.0, -80.0), at(35.0, -90.0)]);
        let MapView::Bounds { bounds, max_zoom } = view else {
            panic!("expected bounds, got {view:?}");
        };
        assert_eq!(max_zoom, MAX_FIT_ZOOM);
        assert!((bounds.north - 36.0).abs() < 1e-9);
        assert!((bounds.south - 24.0).abs() < 1e-9);
        assert!((bounds.east - -79.0).abs() < 1e-9);
        assert!((bounds.west - -91.0).abs() < 1e-9);
    }

    #[test]
    fn colocated_records_still_get_area() {
        let view = fit_records(&[at(30.0, -90.0), at(30.0, -90.0)]);
        let MapView::Bounds { bounds, .. } = view else {
            panic!("expected bounds");
        };
        assert!(bounds.north > bounds.south);
        assert!(bounds.east > bounds.west);
    }
}
