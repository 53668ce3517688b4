use crate::{geodesic::GeodesicModel, reader::HeightReader};
use demfile::{Altitude, LatLon};
use std::sync::Arc;

/// An ordered fallback chain of readers.
///
/// Queries go to each member in order and the first one with data
/// answers. Cloning copies every member, so edits to a clone never
/// affect this stack.
#[derive(Clone)]
pub struct StackReader {
    geodesic: Arc<GeodesicModel>,
    readers: Vec<Box<dyn HeightReader>>,
}

impl StackReader {
    pub fn new(geodesic: Arc<GeodesicModel>) -> Self {
        Self {
            geodesic,
            readers: Vec::new(),
        }
    }

    /// Appends `reader` as the lowest priority member.
    pub fn push(&mut self, reader: Box<dyn HeightReader>) {
        self.readers.push(reader);
    }

    /// Inserts `reader` at `pos`, returning `false` if `pos > len`.
    pub fn insert(&mut self, pos: usize, reader: Box<dyn HeightReader>) -> bool {
        if pos > self.readers.len() {
            return false;
        }
        self.readers.insert(pos, reader);
        true
    }

    /// Removes and returns the member at `pos`, if any.
    pub fn remove(&mut self, pos: usize) -> Option<Box<dyn HeightReader>> {
        (pos < self.readers.len()).then(|| self.readers.remove(pos))
    }

    pub fn clear(&mut self) {
        self.readers.clear();
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    pub fn readers(&self) -> &[Box<dyn HeightReader>] {
        &self.readers
    }
}

impl HeightReader for StackReader {
    fn read_altitude(&self, pos: LatLon, precision: f64) -> Altitude {
        self.readers
            .iter()
            .map(|reader| reader.read_altitude(pos, precision))
            .find(|altitude| altitude.is_some())
            .unwrap_or(Altitude::NONE)
    }

    fn geodesic(&self) -> &GeodesicModel {
        &self.geodesic
    }

    fn clone_reader(&self) -> Box<dyn HeightReader> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::StackReader;
    use crate::{
        geodesic::GeodesicModel,
        reader::{tests::Ramp, EmptyReader, HeightReader},
    };
    use demfile::LatLon;
    use std::sync::Arc;

    fn stack() -> StackReader {
        StackReader::new(Arc::new(GeodesicModel::wgs84()))
    }

    #[test]
    fn test_first_match_wins() {
        let mut stack = stack();
        stack.push(Box::new(EmptyReader::default()));
        stack.push(Box::new(Ramp::band(0.0, 10.0)));
        stack.push(Box::new(Ramp::band(-10.0, 20.0)));

        let pos = LatLon::new(5.0, 1.0);
        assert_eq!(stack.read_altitude(pos, 0.0).get(), Some(5001.0));
        // Only the last member covers 15°N.
        assert_eq!(stack.read_altitude(LatLon::new(15.0, 0.0), 0.0).get(), Some(15000.0));
        // Nobody covers 30°N.
        assert!(stack.read_altitude(LatLon::new(30.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_empty_stack_has_no_data() {
        let stack = stack();
        assert!(stack.is_empty());
        assert!(stack.read_altitude(LatLon::new(0.0, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_insert_remove() {
        let mut stack = stack();
        assert!(stack.insert(0, Box::new(Ramp::band(0.0, 1.0))));
        assert!(!stack.insert(2, Box::new(EmptyReader::default())));
        assert!(stack.insert(1, Box::new(EmptyReader::default())));
        assert_eq!(stack.len(), 2);

        // Put the empty reader in front; the ramp still answers.
        let empty = stack.remove(1).unwrap();
        assert!(stack.insert(0, empty));
        assert_eq!(stack.read_altitude(LatLon::new(0.5, 0.0), 0.0).get(), Some(500.0));

        assert!(stack.remove(2).is_none());
        assert!(stack.remove(1).is_some());
        assert!(stack.read_altitude(LatLon::new(0.5, 0.0), 0.0).is_none());

        stack.clear();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut stack = stack();
        stack.push(Box::new(Ramp::band(0.0, 1.0)));
        let mut copy = stack.clone();
        copy.clear();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.read_altitude(LatLon::new(0.5, 0.0), 0.0).get(), Some(500.0));
        assert!(copy.read_altitude(LatLon::new(0.5, 0.0), 0.0).is_none());
    }

    #[test]
    fn test_nested_stack_and_profile() {
        let mut inner = stack();
        inner.push(Box::new(Ramp::band(-90.0, 90.0)));
        let mut outer = stack();
        outer.push(Box::new(EmptyReader::default()));
        outer.push(inner.clone_reader());
        let profile = outer.profile(LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.01), 100.0, 0.0);
        assert!(profile.len() > 2);
        assert_eq!(profile.last().unwrap().altitude, 0.01);
    }
}
