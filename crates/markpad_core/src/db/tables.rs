//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "data.redb";

/// Canonical shared-document rows (`Document`, bincode-encoded).
pub const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");
/// Share token to document id.
pub const DOCUMENTS_BY_TOKEN: TableDefinition<&str, &str> =
    TableDefinition::new("documents_by_token");
/// Content hash to document id, for exact-content dedupe.
pub const DOCUMENTS_BY_HASH: TableDefinition<&str, &str> =
    TableDefinition::new("documents_by_hash");
/// Uploaded images (`StoredImage`, bincode-encoded).
pub const IMAGES: TableDefinition<&str, &[u8]> = TableDefinition::new("images");
