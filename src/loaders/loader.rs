use crate::model::Registry;
use eyre::Result;

/// Storage backend for the registry contents. Scheduled evaluations are
/// never persisted.
pub trait Loader {
    fn load(&mut self) -> Result<Registry>;
    fn save(&self, registry: &Registry) -> Result<()>;
}
