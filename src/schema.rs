// Kept in sync by hand with the cetane migrations in `crate::migrations`.

diesel::table! {
    documents (id) {
        id -> Integer,
        file_kind -> Text,
        pdf_name -> Text,
        pdf_path -> Text,
        page_count -> Nullable<Integer>,
        file_size_mb -> Double,
        uploaded_by -> Text,
        status -> Text,
        spreadsheet_name -> Text,
        spreadsheet_path -> Text,
        spreadsheet_size_mb -> Double,
        uploaded_at -> Text,
    }
}

diesel::table! {
    comments (id) {
        id -> Integer,
        document_id -> Integer,
        page_number -> Integer,
        x_position -> Double,
        y_position -> Double,
        body -> Text,
        created_by -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(comments -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(comments, documents);
