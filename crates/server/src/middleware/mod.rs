pub mod model_loaders;

pub use model_loaders::{load_designation_middleware, load_task_middleware};
