use itertools::Itertools;
use serde::{ser::SerializeMap, Serialize, Serializer};
use std::fmt;

/// A display band for percent susceptible. Lower bound is inclusive, upper bound is exclusive or
/// unbounded.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Band {
    pub name: &'static str,
    from: f64,
    to: Option<f64>,
    /// Background colour used for cells in this band.
    pub colour: &'static str,
}

const BAND_COUNT: usize = 3;

pub static BANDS: [Band; BAND_COUNT] = [
    Band {
        name: "Poor",
        from: 0.,
        to: Some(60.),
        colour: "#f4a3a3",
    },
    Band {
        name: "Moderate",
        from: 60.,
        to: Some(90.),
        colour: "#f7e08c",
    },
    Band {
        name: "Good",
        from: 90.,
        to: None,
        colour: "#9fd8a4",
    },
];

impl Band {
    pub fn contains(&self, pct: f64) -> bool {
        match self.to {
            Some(end) => pct >= self.from && pct < end,
            None => pct >= self.from,
        }
    }

    /// The band a percentage falls in. Anything below zero is treated as poor.
    pub fn classify(pct: f64) -> &'static Band {
        BANDS
            .iter()
            .rev()
            .find(|band| band.contains(pct))
            .unwrap_or(&BANDS[0])
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to {
            Some(end) if self.from == 0. => write!(f, "{} (<{}%)", self.name, end),
            Some(end) => write!(f, "{} ({}-{}%)", self.name, self.from, end - 1.),
            None => write!(f, "{} (>={}%)", self.name, self.from),
        }
    }
}

/// How many values landed in each band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandCounts {
    counts: [usize; BAND_COUNT],
}

impl BandCounts {
    pub fn bucket_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut counts = [0; BAND_COUNT];
        for value in values {
            let band = Band::classify(value);
            // `classify` always returns an element of `BANDS`
            if let Some(idx) = BANDS.iter().position(|b| b == band) {
                counts[idx] += 1;
            }
        }
        BandCounts { counts }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static Band, usize)> + '_ {
        BANDS.iter().zip_eq(self.counts.iter().copied())
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

impl Serialize for BandCounts {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = s.serialize_map(Some(BAND_COUNT))?;
        for (band, count) in self.iter() {
            map.serialize_entry(band.name, &count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod test {
    use super::{Band, BandCounts};

    #[test]
    fn boundaries() {
        assert_eq!(Band::classify(0.).name, "Poor");
        assert_eq!(Band::classify(59.99).name, "Poor");
        assert_eq!(Band::classify(60.).name, "Moderate");
        assert_eq!(Band::classify(89.9).name, "Moderate");
        assert_eq!(Band::classify(90.).name, "Good");
        assert_eq!(Band::classify(100.).name, "Good");
    }

    #[test]
    fn display() {
        let names: Vec<_> = super::BANDS.iter().map(|b| b.to_string()).collect();
        assert_eq!(names, ["Poor (<60%)", "Moderate (60-89%)", "Good (>=90%)"]);
    }

    #[test]
    fn bucket() {
        let counts = BandCounts::bucket_values([100., 33.3, 61., 90., 0.]);
        let counts: Vec<_> = counts.iter().map(|(band, n)| (band.name, n)).collect();
        assert_eq!(counts, [("Poor", 2), ("Moderate", 1), ("Good", 2)]);
    }

    #[test]
    fn serialize() {
        let counts = BandCounts::bucket_values([95.]);
        assert_eq!(
            serde_json::to_string(&counts).unwrap(),
            r#"{"Poor":0,"Moderate":0,"Good":1}"#
        );
    }
}
