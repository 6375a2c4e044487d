pub mod similarity;
pub mod sketch;
