//! Integration Test Harness
//!
//! - `TestTable` - on-disk SQLite database in a temp directory, with a
//!   seeded party and a store handle
//!
//! # Example
//!
//! ```rust,ignore
//! use harness::TestTable;
//!
//! #[tokio::test]
//! async fn test_party_rests() {
//!     let table = TestTable::start().await.unwrap();
//!     let mut session = table.session();
//!     session.load_roster().await.unwrap();
//! }
//! ```

mod table;

pub use table::TestTable;
