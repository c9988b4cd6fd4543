/// Columns of a flattened file, in order. The staging table uses the same names.
pub const FLAT_COLUMNS: [&str; 11] = [
    "origin",
    "idx",
    "destination",
    "ground",
    "three_day_select",
    "two_day_air",
    "two_day_air_am",
    "next_day_air_saver",
    "next_day_air",
    "unknown1",
    "unknown2",
];

/// Header line written at the top of every flattened file.
pub const FLAT_HEADER: &str = "origin,idx,destination,ground,three_day_select,two_day_air,two_day_air_am,next_day_air_saver,next_day_air,unknown1,unknown2";

/// Leading lines of a raw file (header plus banner rows) that never hold data.
pub const BANNER_LINES: usize = 9;
