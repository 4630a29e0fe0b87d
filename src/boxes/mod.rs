mod header;
mod mfhd;
mod moof;
mod tfdt;
mod tfhd;
mod traf;
mod trun;

pub use header::{BoxHeader, Fourcc};
pub use mfhd::MfhdBox;
pub use moof::MoofBox;
pub use tfdt::TfdtBox;
pub use tfhd::TfhdBox;
pub use traf::TrafBox;
pub use trun::{SampleFlags, TrunBox, TrunSample};
