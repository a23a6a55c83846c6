//! Diesel schema for tasks and the task audit log.

diesel::table! {
    /// Tasks, one row per live task.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning board.
        board_id -> Uuid,
        /// Task title.
        title -> Text,
        /// Optional description.
        description -> Nullable<Text>,
        /// Status lane.
        #[max_length = 20]
        status -> Varchar,
        /// Priority.
        #[max_length = 20]
        priority -> Varchar,
        /// Dense position within the `(board_id, status)` lane.
        position -> Int4,
        /// Optional due timestamp.
        due_date -> Nullable<Timestamptz>,
        /// Creating user.
        creator_id -> Uuid,
        /// Optional assignee.
        assignee_id -> Nullable<Uuid>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only field-level audit trail.
    task_audit_log (seq) {
        /// Commit-order sequence.
        seq -> Int8,
        /// Entry identifier.
        id -> Uuid,
        /// Audited task; kept after the task is deleted.
        task_id -> Uuid,
        /// Acting user.
        actor_id -> Uuid,
        /// Audited field name.
        #[max_length = 50]
        field_name -> Varchar,
        /// Prior value.
        old_value -> Nullable<Text>,
        /// New value.
        new_value -> Nullable<Text>,
        /// Mutation kind.
        #[max_length = 10]
        change_kind -> Varchar,
        /// Mutation timestamp.
        recorded_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(tasks, task_audit_log);
