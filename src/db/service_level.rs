use std::fmt;

/// Shipping speed tiers, in the column order of a zone chart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLevel {
    Ground,
    ThreeDaySelect,
    TwoDayAir,
    TwoDayAirAm,
    NextDayAirSaver,
    NextDayAir,
}

impl ServiceLevel {
    pub const ALL: [ServiceLevel; 6] = [
        ServiceLevel::Ground,
        ServiceLevel::ThreeDaySelect,
        ServiceLevel::TwoDayAir,
        ServiceLevel::TwoDayAirAm,
        ServiceLevel::NextDayAirSaver,
        ServiceLevel::NextDayAir,
    ];

    /// Stored name; also the name of the staging column holding its zone.
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceLevel::Ground => "ground",
            ServiceLevel::ThreeDaySelect => "three_day_select",
            ServiceLevel::TwoDayAir => "two_day_air",
            ServiceLevel::TwoDayAirAm => "two_day_air_am",
            ServiceLevel::NextDayAirSaver => "next_day_air_saver",
            ServiceLevel::NextDayAir => "next_day_air",
        }
    }
}

impl fmt::Display for ServiceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
