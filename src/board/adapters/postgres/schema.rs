//! Diesel schema for boards and board membership.

diesel::table! {
    /// Boards that scope task lanes.
    boards (id) {
        /// Board identifier.
        id -> Uuid,
        /// Board name.
        #[max_length = 255]
        name -> Varchar,
        /// Optional free-form description.
        description -> Nullable<Text>,
        /// Owning user.
        owner_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Board membership records.
    board_members (board_id, user_id) {
        /// Board identifier.
        board_id -> Uuid,
        /// Member user identifier.
        user_id -> Uuid,
        /// Member role.
        #[max_length = 20]
        role -> Varchar,
        /// Join timestamp.
        joined_at -> Timestamptz,
    }
}

diesel::joinable!(board_members -> boards (board_id));
diesel::allow_tables_to_appear_in_same_query!(boards, board_members);
