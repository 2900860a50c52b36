pub mod concurrent_reader;
pub mod cpcb_reader;

pub use concurrent_reader::ConcurrentReader;
pub use cpcb_reader::{parse_concentration, parse_date, CpcbReader, LoadReport};
