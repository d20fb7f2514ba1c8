use cetane::prelude::*;

pub fn migration() -> Migration {
    Migration::new("0002_lookup_indexes")
        .depends_on(&["0001_initial_schema"])
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_documents_status ON documents(status)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_documents_uploaded_by ON documents(uploaded_by)",
        ))
        .operation(RunSql::portable().for_backend(
            "sqlite",
            "CREATE INDEX idx_comments_document_created ON comments(document_id, created_at)",
        ))
}
