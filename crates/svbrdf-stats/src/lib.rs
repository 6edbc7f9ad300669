mod descriptor;
mod error;
mod stats;

pub use descriptor::*;
pub use error::*;
pub use stats::{average_value, load_image, standard_deviation, PixelStats};
