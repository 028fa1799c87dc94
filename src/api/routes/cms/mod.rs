pub mod db;
pub mod public;
pub mod resource;
mod router;

pub use router::router;
