//! CLI command implementations.
//!
//! The binary parses arguments and loads configuration; each submodule
//! implements one command against an [`AtlasConfig`](crate::AtlasConfig).
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `serve` | Run the HTTP API |
//! | `init-schema` | Create the vector index and account constraint |
//! | `load-cypher` | Execute `.cypher` scripts from a directory tree |
//! | `generate-key` | Print a random signing secret for `JWT_SECRET` |
//!
//! # Example Usage
//!
//! ```bash
//! atlas generate-key
//! atlas init-schema --dimensions 768
//! atlas load-cypher ./database/Layer1 --wipe
//! atlas serve --listen 0.0.0.0:8000
//! ```

mod keygen;
mod schema;
mod serve;

pub use keygen::generate_key;
pub use schema::{init_schema, load_cypher};
pub use serve::serve;
