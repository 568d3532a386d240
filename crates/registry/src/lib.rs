pub mod api;
pub mod errors;
pub mod loader;
pub mod model;
pub mod state;

pub use api::Registry;
pub use errors::RegistryError;
pub use loader::{load_path, parse_tours, tour_files};
pub use model::{TourDefinition, TourOptions, TourStep};
pub use state::RegistryImpl;
