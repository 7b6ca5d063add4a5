use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single PMS5003 reading.
///
/// Concentrations are in μg/m³; `_atm` values are corrected for atmospheric
/// environment, the others are CF=1 standard particle values. Particle counts are
/// the number of particles beyond the given diameter in 0.1 L of air.
///
/// See the [`PMS5003 manual`].
///
/// [`PMS5003 manual`]: http://www.aqmd.gov/docs/default-source/aq-spec/resources-page/plantower-pms5003-manual_v2-3.pdf
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Measurement {
    /// PM1.0 concentration (CF=1, standard particle)
    pub pm1_0: u16,
    /// PM2.5 concentration (CF=1, standard particle)
    pub pm2_5: u16,
    /// PM10 concentration (CF=1, standard particle)
    pub pm10: u16,
    /// PM1.0 concentration under atmospheric environment
    pub pm1_0_atm: u16,
    /// PM2.5 concentration under atmospheric environment
    pub pm2_5_atm: u16,
    /// PM10 concentration under atmospheric environment
    pub pm10_atm: u16,
    pub count_gt_0_3um: u16,
    pub count_gt_0_5um: u16,
    pub count_gt_1_0um: u16,
    pub count_gt_2_5um: u16,
    pub count_gt_5_0um: u16,
    pub count_gt_10um: u16,
    pub reserved: u16,
}

impl Measurement {
    /// Number of data fields carried by a frame.
    pub const NUM_FIELDS: usize = 13;

    /// Field names in wire order.
    pub const FIELD_NAMES: [&'static str; Self::NUM_FIELDS] = [
        "pm1_0",
        "pm2_5",
        "pm10",
        "pm1_0_atm",
        "pm2_5_atm",
        "pm10_atm",
        "count_gt_0_3um",
        "count_gt_0_5um",
        "count_gt_1_0um",
        "count_gt_2_5um",
        "count_gt_5_0um",
        "count_gt_10um",
        "reserved",
    ];

    /// Construct from field values in wire order.
    #[must_use]
    pub fn from_fields(f: [u16; Self::NUM_FIELDS]) -> Self {
        Measurement {
            pm1_0: f[0],
            pm2_5: f[1],
            pm10: f[2],
            pm1_0_atm: f[3],
            pm2_5_atm: f[4],
            pm10_atm: f[5],
            count_gt_0_3um: f[6],
            count_gt_0_5um: f[7],
            count_gt_1_0um: f[8],
            count_gt_2_5um: f[9],
            count_gt_5_0um: f[10],
            count_gt_10um: f[11],
            reserved: f[12],
        }
    }

    /// Field values in wire order.
    #[must_use]
    pub fn fields(&self) -> [u16; Self::NUM_FIELDS] {
        [
            self.pm1_0,
            self.pm2_5,
            self.pm10,
            self.pm1_0_atm,
            self.pm2_5_atm,
            self.pm10_atm,
            self.count_gt_0_3um,
            self.count_gt_0_5um,
            self.count_gt_1_0um,
            self.count_gt_2_5um,
            self.count_gt_5_0um,
            self.count_gt_10um,
            self.reserved,
        ]
    }
}

/// A [Measurement] along with the time its frame was fully received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimestampedMeasurement {
    pub timestamp: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub measurement: Measurement,
}
