//! Reading and writing mzML.
//!
//! Only what the scorer needs is decoded: the m/z and intensity arrays, the
//! native id, the MS level and the scan start time. MS-Numpress and integer
//! arrays are reported as unsupported.

mod binary;
pub mod cv;
mod reader;
mod writer;

pub use reader::MzMLSource;
pub use writer::MzMLWriter;
