//! Service layer for business logic with dependency injection.
//!
//! Services accept any `GitHubApi` implementation, enabling testing with
//! mock implementations.

pub mod overview;
#[cfg(test)]
pub mod test_mocks;

pub use overview::{OverviewService, RepoOverview};
