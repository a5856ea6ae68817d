//! Redb table definitions for persistent log storage.

use redb::TableDefinition;

// Single flat keyspace; namespaces are key prefixes (see `keys`)
pub const KV: TableDefinition<&[u8], &[u8]> = TableDefinition::new("kv");
