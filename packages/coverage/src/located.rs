use infra_map_coverage_models::{Hospital, School, Tower};
use infra_map_geometry::{CoordinateError, Coordinates, LocationSource, extract_coordinates};

/// A record with positional fields.
pub(crate) trait Located {
    fn id(&self) -> &str;

    fn location_source(&self) -> LocationSource<'_>;

    /// Resolves the record's position, logging when it cannot be.
    fn coordinates(&self) -> Option<Coordinates> {
        match extract_coordinates(&self.location_source()) {
            Ok(coords) => Some(coords),
            Err(CoordinateError::Unresolvable { description }) => {
                log::debug!("Skipping geometry for {}: {description}", self.id());
                None
            }
        }
    }
}

impl Located for Tower {
    fn id(&self) -> &str {
        &self.id
    }

    fn location_source(&self) -> LocationSource<'_> {
        LocationSource {
            location: self.location.as_ref(),
            latitude: self.latitude,
            longitude: self.longitude,
            properties: Some(&self.properties),
        }
    }
}

impl Located for School {
    fn id(&self) -> &str {
        &self.id
    }

    fn location_source(&self) -> LocationSource<'_> {
        LocationSource {
            location: self.location.as_ref(),
            latitude: self.latitude,
            longitude: self.longitude,
            properties: Some(&self.properties),
        }
    }
}

impl Located for Hospital {
    fn id(&self) -> &str {
        &self.id
    }

    fn location_source(&self) -> LocationSource<'_> {
        LocationSource {
            location: self.location.as_ref(),
            latitude: self.latitude,
            longitude: self.longitude,
            properties: Some(&self.properties),
        }
    }
}
