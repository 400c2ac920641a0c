pub mod mock_driver;

pub use mock_driver::{MockResponse, ScriptedDriver};
