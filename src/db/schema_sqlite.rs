// SQLite schema definitions

diesel::table! {
    chat_credentials (chat_id) {
        chat_id -> BigInt,
        collection_id -> Nullable<Text>,
        secret -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    thread_links (chat_id, message_id) {
        chat_id -> BigInt,
        message_id -> BigInt,
        remote_record_id -> Text,
        created_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(chat_credentials, thread_links);
