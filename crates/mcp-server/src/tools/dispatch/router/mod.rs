// Per-tool dispatch functions used by the MCP tool router.

pub(super) mod error;
pub(super) mod table_preview;
pub(super) mod table_schema;
pub(super) mod tables_list;
