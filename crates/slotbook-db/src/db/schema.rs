// Hand-maintained to match `migrations/`.

diesel::table! {
    profiles (id) {
        id -> Uuid,
        external_user_id -> Text,
        profile_type -> Text,
        display_name -> Nullable<Text>,
        business_name -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    schedules (id) {
        id -> Uuid,
        profile_id -> Uuid,
        name -> Text,
        days_of_week -> Array<Int4>,
        start_time_of_day -> Time,
        end_time_of_day -> Time,
        slot_duration_minutes -> Int4,
        effective_from -> Date,
        effective_until -> Nullable<Date>,
        min_advance_booking_minutes -> Int4,
        max_advance_booking_days -> Int4,
        cancellation_deadline_minutes -> Int4,
        is_active -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    availabilities (id) {
        id -> Uuid,
        host_profile_id -> Uuid,
        schedule_id -> Nullable<Uuid>,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        slot_duration_minutes -> Int4,
        min_advance_booking_minutes -> Int4,
        max_advance_booking_days -> Int4,
        cancellation_deadline_minutes -> Int4,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    time_slots (id) {
        id -> Uuid,
        availability_id -> Uuid,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        status -> Text,
    }
}

diesel::table! {
    appointments (id) {
        id -> Uuid,
        time_slot_id -> Uuid,
        host_profile_id -> Uuid,
        guest_profile_id -> Uuid,
        status -> Text,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        canceled_at -> Nullable<Timestamptz>,
        canceled_by -> Nullable<Text>,
        cancellation_reason -> Nullable<Text>,
        completed_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(schedules -> profiles (profile_id));
diesel::joinable!(availabilities -> profiles (host_profile_id));
diesel::joinable!(availabilities -> schedules (schedule_id));
diesel::joinable!(time_slots -> availabilities (availability_id));
diesel::joinable!(appointments -> time_slots (time_slot_id));

diesel::allow_tables_to_appear_in_same_query!(
    profiles,
    schedules,
    availabilities,
    time_slots,
    appointments,
);
