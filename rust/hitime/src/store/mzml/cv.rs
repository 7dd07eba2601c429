//! Controlled vocabulary accessions used when reading and writing mzML.

pub const MS_LEVEL: &str = "MS:1000511";
pub const SCAN_START_TIME: &str = "MS:1000016";
pub const CENTROID_SPECTRUM: &str = "MS:1000127";
pub const NO_COMBINATION: &str = "MS:1000795";
pub const MS1_SPECTRUM: &str = "MS:1000579";

pub const MZ_ARRAY: &str = "MS:1000514";
pub const INTENSITY_ARRAY: &str = "MS:1000515";

pub const FLOAT_32: &str = "MS:1000521";
pub const FLOAT_64: &str = "MS:1000523";
pub const INT_32: &str = "MS:1000519";
pub const INT_64: &str = "MS:1000522";

pub const ZLIB_COMPRESSION: &str = "MS:1000574";
pub const NO_COMPRESSION: &str = "MS:1000576";
pub const NUMPRESS_LINEAR: &str = "MS:1002312";
pub const NUMPRESS_PIC: &str = "MS:1002313";
pub const NUMPRESS_SLOF: &str = "MS:1002314";

pub const UNIT_MINUTE: &str = "UO:0000031";
pub const UNIT_SECOND: &str = "UO:0000010";
pub const UNIT_MZ: &str = "MS:1000040";
pub const UNIT_COUNTS: &str = "MS:1000131";
