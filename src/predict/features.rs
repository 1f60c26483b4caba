//! Feature vector assembly.

use crate::artifacts::Schema;

/// Validated inputs for one estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    /// Free-form location name.
    pub location: String,
    /// Built-up area in square feet.
    pub total_sqft: f64,
    /// Bathroom count.
    pub bath: u64,
    /// Bedroom count.
    pub bhk: u64,
}

/// Encoded model input for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
    location_index: Option<usize>,
}

impl FeatureVector {
    /// Lay out `query` according to `schema`.
    ///
    /// An unknown location leaves every location column at zero.
    pub fn encode(schema: &Schema, query: &PriceQuery) -> Self {
        let mut values = vec![0.0; schema.len()];
        values[0] = query.total_sqft;
        values[1] = query.bath as f64;
        values[2] = query.bhk as f64;

        let location_index = schema.location_index(&query.location);
        if let Some(idx) = location_index {
            values[idx] = 1.0;
        }

        Self {
            values,
            location_index,
        }
    }

    /// Raw values in schema order.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Column set for the location, or `None` for the baseline.
    pub fn location_index(&self) -> Option<usize> {
        self.location_index
    }

    /// Whether the location block is all zero.
    pub fn is_baseline(&self) -> bool {
        self.location_index.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::schema::FIXED_FEATURES;
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        Schema::new(
            [
                "total_sqft",
                "bath",
                "bhk",
                "location_1st phase jp nagar",
                "location_whitefield",
            ]
            .map(String::from)
            .to_vec(),
        )
        .unwrap()
    }

    fn query(location: &str) -> PriceQuery {
        PriceQuery {
            location: location.to_string(),
            total_sqft: 1000.0,
            bath: 2,
            bhk: 2,
        }
    }

    #[test]
    fn known_location_sets_one_bit() {
        let vector = FeatureVector::encode(&schema(), &query("Whitefield"));
        assert_eq!(vector.as_slice(), &[1000.0, 2.0, 2.0, 0.0, 1.0]);
        assert_eq!(vector.location_index(), Some(4));
    }

    #[test]
    fn unknown_location_is_baseline() {
        let vector = FeatureVector::encode(&schema(), &query("nonexistent area"));
        assert_eq!(vector.as_slice(), &[1000.0, 2.0, 2.0, 0.0, 0.0]);
        assert!(vector.is_baseline());
    }

    #[test]
    fn unknown_location_equals_blank_location() {
        let schema = schema();
        let unknown = FeatureVector::encode(&schema, &query("atlantis"));
        let blank = FeatureVector::encode(&schema, &query(""));
        assert_eq!(unknown, blank);
    }

    #[test]
    fn every_listed_location_sets_exactly_one_bit() {
        let schema = schema();
        for name in schema.locations() {
            let vector = FeatureVector::encode(&schema, &query(name));
            let bits = vector.as_slice()[FIXED_FEATURES..]
                .iter()
                .filter(|v| **v == 1.0)
                .count();
            assert_eq!(bits, 1, "location {name}");
        }
    }
}
