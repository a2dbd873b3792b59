use busline_core::GeoPosition;

/// Growing bounding box, `x` is the longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    min: geo::Coord<f64>,
    max: geo::Coord<f64>,
}

impl BBox {
    pub fn extend<C>(&mut self, coord: C)
    where
        C: Into<geo::Coord<f64>>,
    {
        let coord = coord.into();
        self.min.x = self.min.x.min(coord.x);
        self.min.y = self.min.y.min(coord.y);
        self.max.x = self.max.x.max(coord.x);
        self.max.y = self.max.y.max(coord.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, position: GeoPosition) -> bool {
        let coord: geo::Coord<f64> = position.into();
        !self.is_empty()
            && (self.min.x..=self.max.x).contains(&coord.x)
            && (self.min.y..=self.max.y).contains(&coord.y)
    }

    /// `None` until at least one coordinate was added.
    pub fn to_rect(&self) -> Option<geo::Rect<f64>> {
        if self.is_empty() {
            return None;
        }

        Some(geo::Rect::new(self.min, self.max))
    }
}

impl Default for BBox {
    fn default() -> Self {
        BBox {
            min: geo::Coord {
                x: f64::MAX,
                y: f64::MAX,
            },
            max: geo::Coord {
                x: f64::MIN,
                y: f64::MIN,
            },
        }
    }
}

impl FromIterator<GeoPosition> for BBox {
    fn from_iter<I: IntoIterator<Item = GeoPosition>>(iter: I) -> Self {
        let mut bbox = BBox::default();
        for position in iter {
            bbox.extend(position);
        }
        bbox
    }
}

#[cfg(test)]
mod tests {
    use super::BBox;
    use busline_core::GeoPosition;
    use geo::Coord;

    #[test]
    fn test_bbox_extend() {
        let mut bbox = BBox::default();
        assert!(bbox.is_empty());
        assert_eq!(bbox.to_rect(), None);

        bbox.extend(GeoPosition::new(36.8, 10.1));
        assert_eq!(bbox.min, Coord { x: 10.1, y: 36.8 });
        assert_eq!(bbox.max, Coord { x: 10.1, y: 36.8 });

        bbox.extend(GeoPosition::new(36.9, 10.3));
        bbox.extend(GeoPosition::new(36.7, 10.2));
        assert_eq!(bbox.min, Coord { x: 10.1, y: 36.7 });
        assert_eq!(bbox.max, Coord { x: 10.3, y: 36.9 });
    }

    #[test]
    fn test_bbox_contains() {
        let bbox: BBox = [GeoPosition::new(0.0, 0.0), GeoPosition::new(2.0, 2.0)]
            .into_iter()
            .collect();

        assert!(bbox.contains(GeoPosition::new(1.0, 1.5)));
        assert!(!bbox.contains(GeoPosition::new(3.0, 1.0)));
        assert!(!BBox::default().contains(GeoPosition::new(0.0, 0.0)));
    }
}
