//! Diesel table definitions for the PostgreSQL entity store.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes a table, update this file alongside it (or regenerate
//! it with `diesel print-schema`).

diesel::table! {
    /// Buildings and their cleaning agreement.
    buildings (id) {
        id -> Text,
        name -> Nullable<Text>,
        /// Cleanings owed per day; non-positive values are treated as one.
        required_cleanings_per_day -> Int8,
        cleaning_window_start -> Nullable<Time>,
        cleaning_window_end -> Nullable<Time>,
    }
}

diesel::table! {
    /// Cleanable zones with denormalised freshness.
    checkpoints (id) {
        id -> Text,
        building_id -> Text,
        location_label -> Nullable<Text>,
        is_active -> Bool,
        /// `CLEAN`, `OVERDUE` or `UNKNOWN`.
        current_status -> Text,
        last_cleaned_at -> Nullable<Timestamptz>,
        /// Epoch milliseconds of `last_cleaned_at`, used by range scans.
        last_cleaned_timestamp -> Nullable<Int8>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Delivered cleaning logs.
    cleaning_logs (id) {
        id -> Text,
        cleaner_id -> Text,
        checkpoint_id -> Text,
        building_id -> Text,
        created_at -> Timestamptz,
        proof_of_presence -> Nullable<Jsonb>,
        proof_of_quality -> Nullable<Jsonb>,
        status -> Text,
        flag_reason -> Nullable<Text>,
        rejection_reason -> Nullable<Text>,
    }
}

diesel::table! {
    /// Alerts raised against checkpoints.
    alerts (id) {
        id -> Text,
        checkpoint_id -> Text,
        building_id -> Text,
        kind -> Text,
        severity -> Text,
        status -> Text,
        message -> Nullable<Text>,
        details -> Jsonb,
        related_log_id -> Nullable<Text>,
        created_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
        resolved_by_log_id -> Nullable<Text>,
    }
}

diesel::table! {
    /// Append-only SLA audit trail.
    sla_events (id) {
        id -> Text,
        kind -> Text,
        checkpoint_id -> Text,
        building_id -> Text,
        cleaner_id -> Text,
        gap_duration_ms -> Int8,
        gap_duration_hours -> Float8,
        allowed_duration_ms -> Int8,
        allowed_duration_hours -> Float8,
        previous_cleaning_at -> Timestamptz,
        recovered_at -> Timestamptz,
        recovered_by_log_id -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Streak state per cleaner.
    cleaner_streaks (cleaner_id) {
        cleaner_id -> Text,
        verified_streak -> Int4,
        /// Recently counted log ids, oldest first.
        counted_log_ids -> Array<Text>,
    }
}

diesel::table! {
    /// Per-building daily counters.
    daily_stats (building_id, stats_date) {
        building_id -> Text,
        stats_date -> Date,
        total_logs -> Int8,
        verified_count -> Int8,
        score_sum -> Float8,
        last_updated -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Logs already folded into a day's counters.
    daily_stats_logs (building_id, stats_date, log_id) {
        building_id -> Text,
        stats_date -> Date,
        log_id -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    alerts,
    buildings,
    checkpoints,
    cleaner_streaks,
    cleaning_logs,
    daily_stats,
    daily_stats_logs,
    sla_events,
);
