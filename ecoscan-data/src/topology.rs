//! Fixed-topology zones: a constant set of named sub-areas placed around a
//! center, each deriving its value from a single base reading.
//!
//! Station coverage is too sparse to cluster at neighborhood scale for
//! temperature and traffic, so those modalities use these layouts instead
//! of [`crate::cluster`].

use ecoscan_sources::coordinate::Coordinate;

/// How a sub-area's value is derived from the base reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modifier {
    /// Add a constant
    Offset(f64),
    /// Multiply by a factor
    Scale(f64),
}

impl Modifier {
    pub fn apply(&self, base: f64) -> f64 {
        match self {
            Modifier::Offset(delta) => base + delta,
            Modifier::Scale(factor) => base * factor,
        }
    }
}

/// A named sub-area at a constant offset from the center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneTemplate {
    pub name: &'static str,
    pub lat_offset: f64,
    pub lng_offset: f64,
    pub modifier: Modifier,
    pub radius_meters: f64,
}

impl ZoneTemplate {
    pub fn position(&self, center: &Coordinate) -> Coordinate {
        center.offset(self.lat_offset, self.lng_offset)
    }

    pub fn value(&self, base: f64) -> f64 {
        self.modifier.apply(base)
    }
}

/// A complete layout plus the valid range its values are clamped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Topology {
    pub templates: &'static [ZoneTemplate],
    pub bounds: Option<(f64, f64)>,
}

impl Topology {
    /// Value for one template, clamped to the layout's bounds.
    pub fn value(&self, template: &ZoneTemplate, base: f64) -> f64 {
        let value = template.value(base);
        match self.bounds {
            Some((low, high)) => value.clamp(low, high),
            None => value,
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Urban heat island layout, offsets in °F.
pub static TEMPERATURE_TEMPLATES: [ZoneTemplate; 5] = [
    ZoneTemplate {
        name: "City Center",
        lat_offset: 0.0,
        lng_offset: 0.0,
        modifier: Modifier::Offset(4.0),
        radius_meters: 1500.0,
    },
    ZoneTemplate {
        name: "Park Area",
        lat_offset: 0.02,
        lng_offset: -0.015,
        modifier: Modifier::Offset(-5.0),
        radius_meters: 1200.0,
    },
    ZoneTemplate {
        name: "Industrial Zone",
        lat_offset: -0.018,
        lng_offset: 0.025,
        modifier: Modifier::Offset(6.0),
        radius_meters: 1400.0,
    },
    ZoneTemplate {
        name: "Residential",
        lat_offset: 0.015,
        lng_offset: 0.02,
        modifier: Modifier::Offset(1.0),
        radius_meters: 1800.0,
    },
    ZoneTemplate {
        name: "Waterfront",
        lat_offset: -0.022,
        lng_offset: -0.02,
        modifier: Modifier::Offset(-3.0),
        radius_meters: 1300.0,
    },
];

pub static TEMPERATURE_TOPOLOGY: Topology = Topology {
    templates: &TEMPERATURE_TEMPLATES,
    bounds: None,
};

/// Road pattern layout, factors applied to the composite score.
pub static TRAFFIC_TEMPLATES: [ZoneTemplate; 5] = [
    ZoneTemplate {
        name: "Main Highway",
        lat_offset: 0.01,
        lng_offset: 0.0,
        modifier: Modifier::Scale(1.5),
        radius_meters: 800.0,
    },
    ZoneTemplate {
        name: "Downtown Arterial",
        lat_offset: 0.0,
        lng_offset: 0.0,
        modifier: Modifier::Scale(1.3),
        radius_meters: 600.0,
    },
    ZoneTemplate {
        name: "Industrial Corridor",
        lat_offset: -0.012,
        lng_offset: 0.015,
        modifier: Modifier::Scale(1.4),
        radius_meters: 700.0,
    },
    ZoneTemplate {
        name: "Residential Streets",
        lat_offset: 0.008,
        lng_offset: -0.012,
        modifier: Modifier::Scale(0.7),
        radius_meters: 900.0,
    },
    ZoneTemplate {
        name: "Park Road",
        lat_offset: -0.01,
        lng_offset: -0.01,
        modifier: Modifier::Scale(0.4),
        radius_meters: 500.0,
    },
];

pub static TRAFFIC_TOPOLOGY: Topology = Topology {
    templates: &TRAFFIC_TEMPLATES,
    bounds: Some((0.0, 100.0)),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers() {
        assert_eq!(Modifier::Offset(-5.0).apply(70.0), 65.0);
        assert_eq!(Modifier::Scale(1.5).apply(40.0), 60.0);
    }

    #[test]
    fn test_traffic_values_are_clamped() {
        let highway = &TRAFFIC_TEMPLATES[0];
        assert_eq!(TRAFFIC_TOPOLOGY.value(highway, 80.0), 100.0);
        assert_eq!(TRAFFIC_TOPOLOGY.value(highway, 20.0), 30.0);
    }

    #[test]
    fn test_template_names_are_unique() {
        for topology in [&TEMPERATURE_TOPOLOGY, &TRAFFIC_TOPOLOGY] {
            let mut names: Vec<&str> = topology.templates.iter().map(|t| t.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), topology.len());
        }
    }

    #[test]
    fn test_position() {
        let center = Coordinate::new(37.5, -77.4);
        let park = TEMPERATURE_TEMPLATES[1].position(&center);
        assert!((park.lat - 37.52).abs() < 1e-12);
        assert!((park.lng + 77.415).abs() < 1e-12);
    }
}
