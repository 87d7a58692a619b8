pub mod params;
pub mod status;
