//! Version-control providers.

mod git;

pub use git::{Git2Provider, Git2ProviderConfig};
