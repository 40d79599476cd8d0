mod index_project;
mod reconcile_project;

pub use index_project::{IndexProjectUseCase, IndexStats};
pub use reconcile_project::{ReconcileProjectUseCase, ReconcileStats};
